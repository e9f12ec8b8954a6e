use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::analysis::{fundamental_signal, FinancialMetrics, Signal, SignalReport};
use crate::error::Result;
use super::client::{RunClient, RunHandle, RunStream};
use super::types::{RunEvent, RunRequest};

/// 本地模拟运行客户端
///
/// 不依赖后端服务，按 agent × ticker 顺序产出基本面信号的
/// progress 事件，最后发送 complete。每次发送前检查取消标志，
/// 取消后静默关闭事件流。
pub struct SimulatedRunClient {
    metrics: HashMap<String, FinancialMetrics>,
    step_delay: Duration,
}

impl Default for SimulatedRunClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRunClient {
    pub fn new() -> Self {
        Self {
            metrics: HashMap::new(),
            step_delay: Duration::from_millis(10),
        }
    }

    /// 注册某只股票的财务指标
    pub fn with_metrics(mut self, ticker: impl Into<String>, metrics: FinancialMetrics) -> Self {
        self.metrics.insert(ticker.into(), metrics);
        self
    }

    /// 事件之间的间隔
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    fn report_for(&self, ticker: &str) -> SignalReport {
        match self.metrics.get(ticker) {
            Some(metrics) => fundamental_signal(metrics),
            None => SignalReport {
                signal: Signal::Neutral,
                confidence: 0.0,
                reasoning: json!({ "details": format!("no metrics registered for {ticker}") }),
            },
        }
    }
}

#[async_trait]
impl RunClient for SimulatedRunClient {
    async fn start(&self, request: RunRequest) -> Result<RunStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = RunHandle::new();

        let reports: Vec<(String, String, Value)> = request
            .selected_agents
            .iter()
            .flat_map(|agent| {
                request.tickers.iter().map(move |ticker| {
                    let payload =
                        serde_json::to_value(self.report_for(ticker)).unwrap_or(Value::Null);
                    (agent.clone(), ticker.clone(), payload)
                })
            })
            .collect();

        let step_delay = self.step_delay;
        let cancelled = handle.clone();
        tokio::spawn(async move {
            tx.send(RunEvent::Start).ok();
            for (node_id, ticker, payload) in reports {
                sleep(step_delay).await;
                if cancelled.is_cancelled() {
                    return;
                }
                let event = RunEvent::Progress {
                    node_id,
                    ticker: Some(ticker),
                    payload,
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
            if !cancelled.is_cancelled() {
                tx.send(RunEvent::Complete {
                    payload: Value::Null,
                })
                .ok();
            }
        });

        Ok(RunStream { events: rx, handle })
    }
}
