use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use super::types::{RunEvent, RunRequest};

/// 运行请求外部协作方的接口

/// 取消句柄
///
/// `cancel` 幂等且不会失败；取消后客户端停止发送事件并
/// 关闭底层流。
#[derive(Clone, Debug, Default)]
pub struct RunHandle {
    cancelled: Arc<AtomicBool>,
}

impl RunHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 一次运行的事件流与取消句柄
pub struct RunStream {
    pub events: mpsc::UnboundedReceiver<RunEvent>,
    pub handle: RunHandle,
}

/// 运行客户端 trait
///
/// 接受运行请求，返回服务端推送的事件流；事件按到达顺序
/// 投递，直到 `complete`、`error` 或取消。
#[async_trait]
pub trait RunClient: Send + Sync {
    async fn start(&self, request: RunRequest) -> Result<RunStream>;
}
