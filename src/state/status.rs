use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// 节点运行状态
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Idle,
    InProgress,
    Complete,
    Error,
}

/// 状态变更通知
#[derive(Clone, Debug)]
pub enum StatusChange {
    Updated { node_id: String, status: RunStatus },
    Reset,
}

const NOTIFY_CAPACITY: usize = 256;

/// 节点状态存储
///
/// 画布根据状态给节点着色，通过 `subscribe` 订阅变更。
pub struct NodeStatusStore {
    entries: RwLock<HashMap<String, RunStatus>>,
    notifier: broadcast::Sender<StatusChange>,
}

impl Default for NodeStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStatusStore {
    pub fn new() -> Self {
        let (notifier, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            notifier,
        }
    }

    /// 无条件覆盖节点状态并通知观察者
    pub fn set_status(&self, node_id: impl Into<String>, status: RunStatus) {
        let node_id = node_id.into();
        self.entries.write().insert(node_id.clone(), status);
        self.notifier
            .send(StatusChange::Updated { node_id, status })
            .ok();
    }

    /// 未记录的节点视为 Idle
    pub fn status(&self, node_id: &str) -> RunStatus {
        self.entries
            .read()
            .get(node_id)
            .copied()
            .unwrap_or_default()
    }

    /// 将所有已知节点重置为 Idle
    ///
    /// 每次新运行开始和每次切换 Flow 时必须调用，避免上一次
    /// 运行的着色残留。
    pub fn reset_all(&self) {
        let mut entries = self.entries.write();
        for status in entries.values_mut() {
            *status = RunStatus::Idle;
        }
        drop(entries);
        self.notifier.send(StatusChange::Reset).ok();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.notifier.subscribe()
    }

    /// 当前跟踪的节点 ID 列表
    pub fn tracked(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}
