use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

/// Flow 作用域的节点内部状态层
///
/// 内部状态按 (flow_id, node_id) 存放，读写只作用于当前
/// 活跃作用域。切换作用域时丢弃旧作用域的全部条目，保证
/// 打开另一个 Flow 时看不到上一个 Flow 保存的内部状态。
#[derive(Default)]
pub struct NodeStateStore {
    scope: RwLock<Option<String>>,
    entries: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl NodeStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 切换活跃作用域并清除上一个作用域的条目
    ///
    /// 重新加载同一个 Flow 也会先清空，随后由加载方按保存的
    /// 记录重新填充。
    pub fn set_scope(&self, flow_id: impl Into<String>) {
        let flow_id = flow_id.into();
        let mut scope = self.scope.write();
        if let Some(previous) = scope.take() {
            self.entries.write().remove(&previous);
        }
        *scope = Some(flow_id);
    }

    /// 清除活跃作用域及其条目
    pub fn clear_scope(&self) {
        if let Some(previous) = self.scope.write().take() {
            self.entries.write().remove(&previous);
        }
    }

    pub fn active_scope(&self) -> Option<String> {
        self.scope.read().clone()
    }

    /// 写入当前作用域；无活跃作用域时丢弃
    pub fn set(&self, node_id: impl Into<String>, blob: Value) {
        let scope = self.scope.read();
        let Some(flow_id) = scope.as_ref() else {
            return;
        };
        self.entries
            .write()
            .entry(flow_id.clone())
            .or_default()
            .insert(node_id.into(), blob);
    }

    pub fn get(&self, node_id: &str) -> Option<Value> {
        let scope = self.scope.read();
        let flow_id = scope.as_ref()?;
        self.entries.read().get(flow_id)?.get(node_id).cloned()
    }

    pub fn remove(&self, node_id: &str) {
        let scope = self.scope.read();
        let Some(flow_id) = scope.as_ref() else {
            return;
        };
        if let Some(nodes) = self.entries.write().get_mut(flow_id) {
            nodes.remove(node_id);
        }
    }

    /// 当前作用域的全部内部状态
    pub fn snapshot(&self) -> HashMap<String, Value> {
        let scope = self.scope.read();
        let Some(flow_id) = scope.as_ref() else {
            return HashMap::new();
        };
        self.entries.read().get(flow_id).cloned().unwrap_or_default()
    }
}
