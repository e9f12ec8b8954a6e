pub mod analysis;
pub mod error;
pub mod flow;
pub mod run;
pub mod state;
pub mod utils;
pub mod workspace;

pub use analysis::{
    analyze_performance, fundamental_signal, FinancialMetrics, PerformanceReport, Portfolio,
    Signal, SignalReport, TradeAction,
};
pub use error::{Result, TradeFlowError};
#[cfg(feature = "redis-store")]
pub use flow::RedisFlowStore;
pub use flow::{
    Flow, FlowDraft, FlowEdge, FlowNode, FlowPatch, FlowStore, MemoryFlowStore, NodeData,
    NodeKind, NODE_CONTEXT_KEY,
};
pub use run::{
    RunClient, RunEvent, RunHandle, RunRequest, RunSession, RunSessionManager, RunStream,
    SimulatedRunClient,
};
pub use state::{NodeContextStore, NodeStateStore, NodeStatusStore, RunStatus, StatusChange};
pub use utils::{logging, validation};
pub use workspace::Workspace;
