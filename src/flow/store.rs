use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Result, TradeFlowError};
use super::types::{Flow, FlowDraft, FlowPatch};

/// Flow 持久化协作方接口
///
/// `update` 接受部分记录，返回合并后的完整记录。
#[async_trait]
pub trait FlowStore: Send + Sync {
    async fn create(&self, draft: FlowDraft) -> Result<Flow>;
    async fn update(&self, id: &str, patch: FlowPatch) -> Result<Flow>;
    async fn get(&self, id: &str) -> Result<Option<Flow>>;
    async fn list(&self) -> Result<Vec<Flow>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// 内存存储实现
#[derive(Default)]
pub struct MemoryFlowStore {
    inner: RwLock<HashMap<String, Flow>>,
    next_id: AtomicU64,
}

impl MemoryFlowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStore for MemoryFlowStore {
    async fn create(&self, draft: FlowDraft) -> Result<Flow> {
        let id = format!("flow-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let flow = Flow {
            id: id.clone(),
            name: draft.name,
            description: draft.description,
            nodes: draft.nodes,
            edges: draft.edges,
            data: draft.data,
        };
        self.inner.write().insert(id, flow.clone());
        Ok(flow)
    }

    async fn update(&self, id: &str, patch: FlowPatch) -> Result<Flow> {
        let mut inner = self.inner.write();
        let flow = inner
            .get_mut(id)
            .ok_or_else(|| TradeFlowError::FlowNotFound(id.to_string()))?;
        flow.apply_patch(patch);
        Ok(flow.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Flow>> {
        Ok(self.inner.read().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Flow>> {
        let mut flows: Vec<Flow> = self.inner.read().values().cloned().collect();
        flows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(flows)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.write().remove(id);
        Ok(())
    }
}

#[cfg(feature = "redis-store")]
pub mod redis {
    use super::*;
    use ::redis::AsyncCommands;

    const KEY_PREFIX: &str = "tradeflow:flow";
    const SEQ_KEY: &str = "tradeflow:flow:seq";

    /// Redis 存储实现
    pub struct RedisFlowStore {
        client: ::redis::Client,
    }

    impl RedisFlowStore {
        pub fn new(client: ::redis::Client) -> Self {
            Self { client }
        }

        fn key(id: &str) -> String {
            format!("{KEY_PREFIX}:{id}")
        }

        async fn connection(&self) -> Result<::redis::aio::MultiplexedConnection> {
            self.client
                .get_multiplexed_async_connection()
                .await
                .map_err(|e| TradeFlowError::Store(e.to_string()))
        }

        fn encode(flow: &Flow) -> Result<String> {
            serde_json::to_string(flow).map_err(|e| TradeFlowError::Serialization(e.to_string()))
        }

        fn decode(raw: &str) -> Result<Flow> {
            serde_json::from_str(raw).map_err(|e| TradeFlowError::Serialization(e.to_string()))
        }
    }

    #[async_trait]
    impl FlowStore for RedisFlowStore {
        async fn create(&self, draft: FlowDraft) -> Result<Flow> {
            let mut conn = self.connection().await?;
            let seq: u64 = conn
                .incr(SEQ_KEY, 1)
                .await
                .map_err(|e| TradeFlowError::Store(e.to_string()))?;
            let id = format!("flow-{seq}");
            let flow = Flow {
                id: id.clone(),
                name: draft.name,
                description: draft.description,
                nodes: draft.nodes,
                edges: draft.edges,
                data: draft.data,
            };
            let _: () = conn
                .set(Self::key(&id), Self::encode(&flow)?)
                .await
                .map_err(|e| TradeFlowError::Store(e.to_string()))?;
            Ok(flow)
        }

        async fn update(&self, id: &str, patch: FlowPatch) -> Result<Flow> {
            let mut conn = self.connection().await?;
            let raw: Option<String> = conn
                .get(Self::key(id))
                .await
                .map_err(|e| TradeFlowError::Store(e.to_string()))?;
            let mut flow =
                Self::decode(&raw.ok_or_else(|| TradeFlowError::FlowNotFound(id.to_string()))?)?;
            flow.apply_patch(patch);
            let _: () = conn
                .set(Self::key(id), Self::encode(&flow)?)
                .await
                .map_err(|e| TradeFlowError::Store(e.to_string()))?;
            Ok(flow)
        }

        async fn get(&self, id: &str) -> Result<Option<Flow>> {
            let mut conn = self.connection().await?;
            let raw: Option<String> = conn
                .get(Self::key(id))
                .await
                .map_err(|e| TradeFlowError::Store(e.to_string()))?;
            raw.as_deref().map(Self::decode).transpose()
        }

        async fn list(&self) -> Result<Vec<Flow>> {
            let mut conn = self.connection().await?;
            let keys: Vec<String> = conn
                .keys(format!("{KEY_PREFIX}:flow-*"))
                .await
                .map_err(|e| TradeFlowError::Store(e.to_string()))?;
            let mut flows = Vec::with_capacity(keys.len());
            for key in keys {
                let raw: Option<String> = conn
                    .get(&key)
                    .await
                    .map_err(|e| TradeFlowError::Store(e.to_string()))?;
                if let Some(raw) = raw {
                    flows.push(Self::decode(&raw)?);
                }
            }
            flows.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(flows)
        }

        async fn delete(&self, id: &str) -> Result<()> {
            let mut conn = self.connection().await?;
            let _: () = conn
                .del(Self::key(id))
                .await
                .map_err(|e| TradeFlowError::Store(e.to_string()))?;
            Ok(())
        }
    }
}
