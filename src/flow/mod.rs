// Flow 记录与持久化协作方模块

mod store;
mod types;

#[cfg(feature = "redis-store")]
pub use store::redis::RedisFlowStore;
pub use store::{FlowStore, MemoryFlowStore};
pub use types::{
    Flow, FlowDraft, FlowEdge, FlowNode, FlowPatch, NodeData, NodeKind, NODE_CONTEXT_KEY,
};
