use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde_json::Value;

/// 节点上下文存储
///
/// 保存节点在运行期间产生的任意数据（消息、信号、输出值），
/// 独立于静态图结构，供 UI 实时查看并随 Flow 持久化往返。
#[derive(Default)]
pub struct NodeContextStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl NodeContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整体替换节点的上下文
    pub fn set_context(&self, node_id: impl Into<String>, payload: Value) {
        self.entries.write().insert(node_id.into(), payload);
    }

    /// 浅合并对象载荷；任一侧不是对象时退化为替换
    pub fn merge_context(&self, node_id: impl Into<String>, payload: Value) {
        let node_id = node_id.into();
        let mut entries = self.entries.write();
        match (entries.get_mut(&node_id), payload) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (key, value) in incoming {
                    existing.insert(key, value);
                }
            }
            (_, payload) => {
                entries.insert(node_id, payload);
            }
        }
    }

    pub fn context(&self, node_id: &str) -> Option<Value> {
        self.entries.read().get(node_id).cloned()
    }

    /// 显式清除某个节点的上下文，导出时不再包含
    pub fn clear(&self, node_id: &str) {
        self.entries.write().remove(node_id);
    }

    /// 确定性快照，用于持久化
    pub fn export_all(&self) -> BTreeMap<String, Value> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// 整体替换存储内容，用于加载
    pub fn import_all(&self, mapping: BTreeMap<String, Value>) {
        *self.entries.write() = mapping.into_iter().collect();
    }

    /// 清空所有条目
    ///
    /// 加载另一个 Flow 之前必须调用，保证不跨 Flow 泄漏。
    pub fn reset_all(&self) {
        self.entries.write().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
