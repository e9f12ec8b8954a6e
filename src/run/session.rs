use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use crate::error::Result;
use crate::state::{NodeContextStore, NodeStatusStore, RunStatus};
use super::client::{RunClient, RunHandle};
use super::types::{RunEvent, RunRequest};

/// 运行会话管理

/// 单次运行会话
///
/// 持有取消句柄、参与运行的节点集合与终止标志。同一工作区
/// 任意时刻最多只有一个非终止会话。
pub struct RunSession {
    id: u64,
    initiator: String,
    node_ids: Vec<String>,
    handle: RunHandle,
    terminal: AtomicBool,
}

impl RunSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn initiator(&self) -> &str {
        &self.initiator
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::SeqCst)
    }

    fn mark_terminal(&self) {
        self.terminal.store(true, Ordering::SeqCst);
    }
}

/// 会话管理器
///
/// 驱动一次针对节点图的执行：发起请求、消费事件流、维护两个
/// 存储的一致性。每个会话带有代际标识，事件落盘前检查代际是
/// 否仍然存活，已取消会话的在途事件一律丢弃。
pub struct RunSessionManager {
    client: Arc<dyn RunClient>,
    status: Arc<NodeStatusStore>,
    context: Arc<NodeContextStore>,
    next_id: AtomicU64,
    live: Arc<AtomicU64>,
    // 事件落盘与取消互斥：持有该锁期间代际不会被并发失效
    apply: Arc<Mutex<()>>,
    active: Mutex<Option<Arc<RunSession>>>,
}

impl RunSessionManager {
    pub fn new(
        client: Arc<dyn RunClient>,
        status: Arc<NodeStatusStore>,
        context: Arc<NodeContextStore>,
    ) -> Self {
        Self {
            client,
            status,
            context,
            next_id: AtomicU64::new(0),
            live: Arc::new(AtomicU64::new(0)),
            apply: Arc::new(Mutex::new(())),
            active: Mutex::new(None),
        }
    }

    /// 启动一次运行
    ///
    /// 先取消上一个会话并重置全部节点状态，再将发起节点标记
    /// 为 InProgress。返回新会话的 ID。
    pub async fn start_run(&self, initiator: &str, request: RunRequest) -> Result<u64> {
        self.cancel();
        self.status.reset_all();
        self.status.set_status(initiator, RunStatus::InProgress);

        let stream = match self.client.start(request.clone()).await {
            Ok(stream) => stream,
            Err(error) => {
                crate::log_error!(error, operation = "start_run");
                self.status.set_status(initiator, RunStatus::Error);
                return Err(error);
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Arc::new(RunSession {
            id,
            initiator: initiator.to_string(),
            node_ids: request.selected_agents,
            handle: stream.handle,
            terminal: AtomicBool::new(false),
        });

        self.live.store(id, Ordering::SeqCst);
        *self.active.lock() = Some(Arc::clone(&session));

        let live = Arc::clone(&self.live);
        let apply = Arc::clone(&self.apply);
        let status = Arc::clone(&self.status);
        let context = Arc::clone(&self.context);
        let mut events = stream.events;
        tokio::spawn({
            let session = Arc::clone(&session);
            async move {
                while let Some(event) = events.recv().await {
                    // 代际检查与落盘在应用锁内进行，cancel 返回后
                    // 不会再有本会话的事件触碰共享状态
                    let _guard = apply.lock();
                    if live.load(Ordering::SeqCst) != session.id {
                        tracing::debug!(session = session.id, "dropping event for stale session");
                        break;
                    }
                    match event {
                        RunEvent::Start => {
                            tracing::debug!(session = session.id, "run started");
                        }
                        RunEvent::Progress {
                            node_id,
                            ticker,
                            payload,
                        } => match ticker {
                            Some(ticker) => {
                                context.merge_context(&node_id, json!({ ticker: payload }));
                            }
                            None => context.set_context(&node_id, payload),
                        },
                        RunEvent::Complete { .. } => {
                            status.set_status(&session.initiator, RunStatus::Complete);
                            session.mark_terminal();
                            break;
                        }
                        RunEvent::Error { message } => {
                            crate::log_warn!("run failed", session = session.id, message = message.as_str());
                            status.set_status(&session.initiator, RunStatus::Error);
                            session.mark_terminal();
                            break;
                        }
                    }
                }
                // 事件流关闭而没有终止事件时，会话同样视为终止
                session.mark_terminal();
            }
        });

        Ok(id)
    }

    /// 取消当前会话
    ///
    /// 在应用锁内使代际失效，保证已入队事件不会再落盘，然后
    /// 调用取消句柄关闭底层流。
    pub fn cancel(&self) {
        {
            let _guard = self.apply.lock();
            self.live.store(0, Ordering::SeqCst);
        }
        if let Some(session) = self.active.lock().take() {
            session.handle.cancel();
            session.mark_terminal();
        }
    }

    /// 是否存在非终止会话
    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .map(|session| !session.is_terminal())
            .unwrap_or(false)
    }

    /// 当前（或最近一次）会话
    pub fn current(&self) -> Option<Arc<RunSession>> {
        self.active.lock().clone()
    }
}
