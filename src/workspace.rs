use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{Result, TradeFlowError};
use crate::flow::{Flow, FlowDraft, FlowEdge, FlowNode, FlowPatch, FlowStore, NODE_CONTEXT_KEY};
use crate::run::{RunClient, RunRequest, RunSessionManager};
use crate::state::{NodeContextStore, NodeStateStore, NodeStatusStore};
use crate::utils::ConfigValidator;

/// 首次保存之前使用的草稿作用域
const DRAFT_SCOPE: &str = "draft";

/// 未命名 Flow 的默认名称
const UNTITLED_NAME: &str = "Untitled Flow";

/// 实时图快照
#[derive(Clone, Default)]
struct GraphState {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
}

/// 工作区
///
/// 持有实时图、三个状态存储与会话管理器，并充当 Flow 持久化
/// 协调者：保存时把图结构、节点内部状态与节点上下文合并成一条
/// 记录，加载时按顺序清理并恢复三者。一个工作区同一时刻只打开
/// 一个 Flow。
pub struct Workspace {
    graph: RwLock<GraphState>,
    status: Arc<NodeStatusStore>,
    context: Arc<NodeContextStore>,
    node_state: Arc<NodeStateStore>,
    runs: RunSessionManager,
    flows: Arc<dyn FlowStore>,
    active_flow: RwLock<Option<String>>,
}

impl Workspace {
    pub fn new(flows: Arc<dyn FlowStore>, client: Arc<dyn RunClient>) -> Self {
        let status = Arc::new(NodeStatusStore::new());
        let context = Arc::new(NodeContextStore::new());
        let node_state = Arc::new(NodeStateStore::new());
        node_state.set_scope(DRAFT_SCOPE);
        let runs = RunSessionManager::new(client, Arc::clone(&status), Arc::clone(&context));
        Self {
            graph: RwLock::new(GraphState::default()),
            status,
            context,
            node_state,
            runs,
            flows,
            active_flow: RwLock::new(None),
        }
    }

    pub fn status(&self) -> &Arc<NodeStatusStore> {
        &self.status
    }

    pub fn context(&self) -> &Arc<NodeContextStore> {
        &self.context
    }

    pub fn node_state(&self) -> &Arc<NodeStateStore> {
        &self.node_state
    }

    pub fn runs(&self) -> &RunSessionManager {
        &self.runs
    }

    pub fn active_flow(&self) -> Option<String> {
        self.active_flow.read().clone()
    }

    /// 画布边界：整体替换实时图
    pub fn set_graph(&self, nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Result<()> {
        for node in &nodes {
            ConfigValidator::validate_node_id(&node.id)?;
        }
        *self.graph.write() = GraphState { nodes, edges };
        Ok(())
    }

    pub fn graph(&self) -> (Vec<FlowNode>, Vec<FlowEdge>) {
        let graph = self.graph.read();
        (graph.nodes.clone(), graph.edges.clone())
    }

    /// 写入节点内部状态（当前 Flow 作用域）
    pub fn set_node_internal_state(&self, node_id: &str, blob: Value) -> Result<()> {
        if !self.graph.read().nodes.iter().any(|n| n.id == node_id) {
            return Err(TradeFlowError::UnknownNode(node_id.to_string()));
        }
        self.node_state.set(node_id, blob);
        Ok(())
    }

    pub fn node_internal_state(&self, node_id: &str) -> Option<Value> {
        self.node_state.get(node_id)
    }

    /// 启动一次运行；发起节点必须存在于实时图中
    pub async fn start_run(&self, initiator: &str, request: RunRequest) -> Result<u64> {
        for ticker in &request.tickers {
            ConfigValidator::validate_ticker(ticker)?;
        }
        if !self.graph.read().nodes.iter().any(|n| n.id == initiator) {
            return Err(TradeFlowError::UnknownNode(initiator.to_string()));
        }
        self.runs.start_run(initiator, request).await
    }

    pub fn cancel_run(&self) {
        self.runs.cancel();
    }

    /// 创建一个空 Flow
    pub async fn create_flow(&self, name: &str, description: &str) -> Result<Flow> {
        ConfigValidator::validate_flow_name(name)?;
        self.flows
            .create(FlowDraft {
                name: name.to_string(),
                description: description.to_string(),
                ..FlowDraft::default()
            })
            .await
    }

    pub async fn list_flows(&self) -> Result<Vec<Flow>> {
        self.flows.list().await
    }

    pub async fn get_flow(&self, id: &str) -> Result<Option<Flow>> {
        self.flows.get(id).await
    }

    /// 删除 Flow；删除当前打开的 Flow 时同时清空运行期状态
    pub async fn delete_flow(&self, id: &str) -> Result<()> {
        self.flows.delete(id).await?;
        let mut active = self.active_flow.write();
        if active.as_deref() == Some(id) {
            *active = None;
            drop(active);
            self.node_state.clear_scope();
            self.node_state.set_scope(DRAFT_SCOPE);
            self.context.reset_all();
            self.status.reset_all();
        }
        Ok(())
    }

    /// 保存完整状态：图结构 + 节点内部状态 + 节点上下文
    ///
    /// 增强后的节点列表是保存期的纯变换产物，实时图不被触碰。
    /// 失败只记录日志并返回 None。
    pub async fn save_with_state(
        &self,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Option<Flow> {
        match self.try_save(name, description).await {
            Ok(flow) => Some(flow),
            Err(error) => {
                crate::log_error!(error, operation = "save_with_state");
                None
            }
        }
    }

    async fn try_save(&self, name: Option<&str>, description: Option<&str>) -> Result<Flow> {
        let (nodes, edges) = self.graph();
        let exported = self.context.export_all();
        let enhanced = enhance_nodes(nodes, &self.node_state);

        let active = self.active_flow.read().clone();
        let saved = match active {
            Some(id) => {
                let mut patch = FlowPatch::default().with_graph(enhanced, edges);
                if let Some(name) = name {
                    ConfigValidator::validate_flow_name(name)?;
                    patch = patch.with_name(name);
                }
                if let Some(description) = description {
                    patch = patch.with_description(description);
                }
                self.flows.update(&id, patch).await?
            }
            None => {
                let name = name.unwrap_or(UNTITLED_NAME);
                ConfigValidator::validate_flow_name(name)?;
                self.flows
                    .create(FlowDraft {
                        name: name.to_string(),
                        description: description.unwrap_or_default().to_string(),
                        nodes: enhanced,
                        edges,
                        data: Map::new(),
                    })
                    .await?
            }
        };

        let context_value = serde_json::to_value(&exported)
            .map_err(|e| TradeFlowError::Serialization(e.to_string()))?;
        let updated = self
            .flows
            .update(
                &saved.id,
                FlowPatch::default().with_data_entry(NODE_CONTEXT_KEY, context_value),
            )
            .await?;

        *self.active_flow.write() = Some(updated.id.clone());
        tracing::info!(flow = %updated.id, "flow saved with complete state");
        Ok(updated)
    }

    /// 按 id 加载 Flow
    pub async fn load_flow(&self, id: &str) -> Result<Flow> {
        let flow = self
            .flows
            .get(id)
            .await?
            .ok_or_else(|| TradeFlowError::FlowNotFound(id.to_string()))?;
        self.load_with_state(&flow)?;
        Ok(flow)
    }

    /// 加载完整状态
    ///
    /// 顺序不可调换：先切换内部状态作用域（清掉上一个 Flow 的
    /// 条目），再清空上下文与节点状态着色，然后应用图结构，最后
    /// 在有效节点集合就位后恢复内部状态与上下文。
    pub fn load_with_state(&self, flow: &Flow) -> Result<()> {
        self.node_state.set_scope(&flow.id);
        self.context.reset_all();
        self.status.reset_all();

        // 内部状态只是保存期产物，不进入实时图
        let mut nodes = flow.nodes.clone();
        let mut blobs = Vec::new();
        for node in &mut nodes {
            if let Some(blob) = node.data.internal_state.take() {
                blobs.push((node.id.clone(), blob));
            }
        }
        *self.graph.write() = GraphState {
            nodes,
            edges: flow.edges.clone(),
        };

        for (node_id, blob) in blobs {
            self.node_state.set(node_id, blob);
        }

        if let Some(mapping) = flow.node_context_data() {
            let graph = self.graph.read();
            let mapping = mapping
                .into_iter()
                .filter(|(node_id, _)| graph.nodes.iter().any(|n| &n.id == node_id))
                .collect();
            drop(graph);
            self.context.import_all(mapping);
        }

        *self.active_flow.write() = Some(flow.id.clone());
        tracing::info!(flow = %flow.id, "flow loaded with complete state");
        Ok(())
    }
}

/// 纯变换：为携带非空内部状态的节点附加状态 blob
fn enhance_nodes(nodes: Vec<FlowNode>, state: &NodeStateStore) -> Vec<FlowNode> {
    let blobs = state.snapshot();
    nodes
        .into_iter()
        .map(|mut node| {
            node.data.internal_state = match blobs.get(&node.id) {
                Some(blob) if !is_empty_blob(blob) => Some(blob.clone()),
                _ => None,
            };
            node
        })
        .collect()
}

fn is_empty_blob(blob: &Value) -> bool {
    match blob {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(m) => m.is_empty(),
        _ => false,
    }
}
