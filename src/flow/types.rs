use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flow 持久化记录类型定义

/// 辅助载荷桶中存放节点上下文映射的键
pub const NODE_CONTEXT_KEY: &str = "nodeContextData";

/// 已保存的 Flow 记录：图结构 + 辅助载荷桶
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Flow {
    /// 辅助载荷桶中的节点上下文映射
    pub fn node_context_data(&self) -> Option<BTreeMap<String, Value>> {
        let value = self.data.get(NODE_CONTEXT_KEY)?.clone();
        serde_json::from_value(value).ok()
    }

    /// 字段级合并一个部分更新
    pub fn apply_patch(&mut self, patch: FlowPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(nodes) = patch.nodes {
            self.nodes = nodes;
        }
        if let Some(edges) = patch.edges {
            self.edges = edges;
        }
        if let Some(data) = patch.data {
            for (key, value) in data {
                self.data.insert(key, value);
            }
        }
    }
}

/// 节点类型标签，决定节点的能力变体
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Agent,
    TickerInput,
    PortfolioOutput,
}

/// 图中的单个节点
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub data: NodeData,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            data: NodeData {
                name: name.into(),
                ..NodeData::default()
            },
        }
    }
}

/// 节点数据桶：声明式配置 + 可选的内部状态序列化
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_state: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 有向边
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl FlowEdge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// 创建 Flow 的载荷，id 由存储分配
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// 部分更新载荷；`data` 按键合并，其余字段整体替换
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<FlowNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<FlowEdge>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl FlowPatch {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_graph(mut self, nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Self {
        self.nodes = Some(nodes);
        self.edges = Some(edges);
        self
    }

    pub fn with_data_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}
