use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 运行请求与事件类型定义

/// 一次运行的请求：股票列表 + 参与运行的节点集合
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRequest {
    pub tickers: Vec<String>,
    pub selected_agents: Vec<String>,
}

impl RunRequest {
    pub fn new(
        tickers: impl IntoIterator<Item = impl Into<String>>,
        selected_agents: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            tickers: tickers.into_iter().map(Into::into).collect(),
            selected_agents: selected_agents.into_iter().map(Into::into).collect(),
        }
    }
}

/// 运行事件流中的单个事件
///
/// `complete` / `error` 终止会话；`progress` 透传给节点上下文
/// 存储，是各节点类型展示中间输出的扩展点。
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Start,
    Progress {
        node_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticker: Option<String>,
        #[serde(default)]
        payload: Value,
    },
    Complete {
        #[serde(default, skip_serializing_if = "Value::is_null")]
        payload: Value,
    },
    Error {
        message: String,
    },
}
