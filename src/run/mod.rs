// 运行会话模块

mod client;
mod session;
mod sim;
mod types;

pub use client::{RunClient, RunHandle, RunStream};
pub use session::{RunSession, RunSessionManager};
pub use sim::SimulatedRunClient;
pub use types::{RunEvent, RunRequest};
