// 状态管理模块

mod context;
mod node_state;
mod status;

pub use context::NodeContextStore;
pub use node_state::NodeStateStore;
pub use status::{NodeStatusStore, RunStatus, StatusChange};
