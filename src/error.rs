use thiserror::Error;

pub type Result<T> = std::result::Result<T, TradeFlowError>;

#[derive(Debug, Error)]
pub enum TradeFlowError {
    #[error("unknown node `{0}` in flow")]
    UnknownNode(String),
    #[error("flow `{0}` not found")]
    FlowNotFound(String),
    #[error("run stream error: {0}")]
    RunStream(String),
    #[error("flow store error: {0}")]
    Store(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
