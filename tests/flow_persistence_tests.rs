use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use tradeflow::{
    Flow, FlowDraft, FlowEdge, FlowNode, FlowPatch, FlowStore, MemoryFlowStore, NodeKind,
    RunStatus, SimulatedRunClient, TradeFlowError, Workspace,
};

fn workspace(store: Arc<MemoryFlowStore>) -> Workspace {
    Workspace::new(store, Arc::new(SimulatedRunClient::new()))
}

fn sample_graph() -> (Vec<FlowNode>, Vec<FlowEdge>) {
    let nodes = vec![
        FlowNode::new("fundamentals", NodeKind::Agent, "Fundamentals"),
        FlowNode::new("portfolio", NodeKind::PortfolioOutput, "Portfolio Manager"),
    ];
    let edges = vec![FlowEdge::new("e1", "fundamentals", "portfolio")];
    (nodes, edges)
}

#[tokio::test]
async fn save_and_load_round_trip_complete_state() -> anyhow::Result<()> {
    let store = Arc::new(MemoryFlowStore::new());
    let ws = workspace(store.clone());

    let (nodes, edges) = sample_graph();
    ws.set_graph(nodes, edges)?;
    ws.set_node_internal_state("fundamentals", json!({ "x": 1 }))?;
    ws.context().set_context("fundamentals", json!("msg"));

    let saved = ws
        .save_with_state(Some("My Strategy"), Some("test flow"))
        .await
        .expect("save should succeed");
    assert_eq!(saved.name, "My Strategy");

    // Persisted record carries the blob and the context mapping.
    let record = store.get(&saved.id).await?.unwrap();
    let node = record.nodes.iter().find(|n| n.id == "fundamentals").unwrap();
    assert_eq!(node.data.internal_state, Some(json!({ "x": 1 })));
    assert_eq!(
        record.node_context_data().unwrap().get("fundamentals"),
        Some(&json!("msg"))
    );

    // Fresh workspace, fresh scope: everything comes back from the record.
    let ws2 = workspace(store.clone());
    ws2.load_flow(&saved.id).await?;
    assert_eq!(
        ws2.node_internal_state("fundamentals"),
        Some(json!({ "x": 1 }))
    );
    assert_eq!(ws2.context().context("fundamentals"), Some(json!("msg")));

    // The enhancement never reaches the live graph.
    let (nodes, _) = ws2.graph();
    assert!(nodes.iter().all(|n| n.data.internal_state.is_none()));
    Ok(())
}

#[tokio::test]
async fn loading_another_flow_clears_previous_state() -> anyhow::Result<()> {
    let store = Arc::new(MemoryFlowStore::new());
    let ws = workspace(store.clone());

    let (nodes, edges) = sample_graph();
    ws.set_graph(nodes, edges)?;
    ws.context().set_context("fundamentals", json!("p"));
    ws.set_node_internal_state("fundamentals", json!({ "x": 1 }))?;
    let first = ws.save_with_state(Some("F1"), None).await.unwrap();

    let second = ws.create_flow("F2", "empty").await?;
    ws.load_flow(&second.id).await?;

    assert!(ws.context().is_empty(), "F1 context must not leak into F2");
    assert_eq!(ws.node_internal_state("fundamentals"), None);
    assert_eq!(ws.active_flow(), Some(second.id.clone()));
    assert!(ws.graph().0.is_empty());

    // Switching back restores F1 as saved.
    ws.load_flow(&first.id).await?;
    assert_eq!(ws.context().context("fundamentals"), Some(json!("p")));
    Ok(())
}

#[tokio::test]
async fn empty_internal_state_is_never_persisted() -> anyhow::Result<()> {
    let store = Arc::new(MemoryFlowStore::new());
    let ws = workspace(store.clone());

    let (nodes, edges) = sample_graph();
    ws.set_graph(nodes, edges)?;
    ws.set_node_internal_state("fundamentals", json!({}))?;
    ws.set_node_internal_state("portfolio", json!(null))?;

    let saved = ws.save_with_state(None, None).await.unwrap();
    let record = store.get(&saved.id).await?.unwrap();
    for node in &record.nodes {
        assert!(
            node.data.internal_state.is_none(),
            "node {} must not carry an empty blob",
            node.id
        );
    }

    let raw = serde_json::to_string(&record)?;
    assert!(!raw.contains("internal_state"));
    Ok(())
}

#[tokio::test]
async fn saving_twice_updates_the_same_flow() -> anyhow::Result<()> {
    let store = Arc::new(MemoryFlowStore::new());
    let ws = workspace(store.clone());

    let (nodes, edges) = sample_graph();
    ws.set_graph(nodes, edges)?;
    let first = ws.save_with_state(Some("F1"), None).await.unwrap();
    let second = ws.save_with_state(None, None).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "F1");
    assert_eq!(store.list().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn load_resets_node_statuses() -> anyhow::Result<()> {
    let store = Arc::new(MemoryFlowStore::new());
    let ws = workspace(store.clone());

    let (nodes, edges) = sample_graph();
    ws.set_graph(nodes, edges)?;
    let saved = ws.save_with_state(Some("F1"), None).await.unwrap();

    ws.status().set_status("portfolio", RunStatus::Complete);
    ws.load_flow(&saved.id).await?;
    assert_eq!(ws.status().status("portfolio"), RunStatus::Idle);
    Ok(())
}

#[tokio::test]
async fn loading_missing_flow_is_an_error() -> anyhow::Result<()> {
    let store = Arc::new(MemoryFlowStore::new());
    let ws = workspace(store);

    let result = ws.load_flow("flow-404").await;
    assert!(matches!(result, Err(TradeFlowError::FlowNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn context_for_unknown_nodes_is_dropped_on_load() -> anyhow::Result<()> {
    let store = Arc::new(MemoryFlowStore::new());
    let flow = store
        .create(FlowDraft {
            name: "F1".to_string(),
            nodes: vec![FlowNode::new("a", NodeKind::Agent, "A")],
            ..FlowDraft::default()
        })
        .await?;
    store
        .update(
            &flow.id,
            FlowPatch::default().with_data_entry(
                tradeflow::NODE_CONTEXT_KEY,
                json!({ "a": "keep", "ghost": "drop" }),
            ),
        )
        .await?;

    let ws = workspace(store.clone());
    ws.load_flow(&flow.id).await?;
    assert_eq!(ws.context().context("a"), Some(json!("keep")));
    assert_eq!(ws.context().context("ghost"), None);
    Ok(())
}

#[tokio::test]
async fn deleting_the_active_flow_clears_runtime_state() -> anyhow::Result<()> {
    let store = Arc::new(MemoryFlowStore::new());
    let ws = workspace(store.clone());

    let (nodes, edges) = sample_graph();
    ws.set_graph(nodes, edges)?;
    ws.context().set_context("fundamentals", json!("p"));
    let saved = ws.save_with_state(Some("F1"), None).await.unwrap();

    ws.delete_flow(&saved.id).await?;
    assert_eq!(ws.active_flow(), None);
    assert!(ws.context().is_empty());
    assert_eq!(store.get(&saved.id).await?, None);
    Ok(())
}

/// Store stub whose mutations always fail.
struct FailingFlowStore;

#[async_trait]
impl FlowStore for FailingFlowStore {
    async fn create(&self, _draft: FlowDraft) -> tradeflow::Result<Flow> {
        Err(TradeFlowError::Store("backend unavailable".to_string()))
    }

    async fn update(&self, _id: &str, _patch: FlowPatch) -> tradeflow::Result<Flow> {
        Err(TradeFlowError::Store("backend unavailable".to_string()))
    }

    async fn get(&self, _id: &str) -> tradeflow::Result<Option<Flow>> {
        Ok(None)
    }

    async fn list(&self) -> tradeflow::Result<Vec<Flow>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _id: &str) -> tradeflow::Result<()> {
        Err(TradeFlowError::Store("backend unavailable".to_string()))
    }
}

#[tokio::test]
async fn save_failure_is_logged_and_returns_none() -> anyhow::Result<()> {
    let ws = Workspace::new(Arc::new(FailingFlowStore), Arc::new(SimulatedRunClient::new()));
    let (nodes, edges) = sample_graph();
    ws.set_graph(nodes, edges)?;

    assert!(ws.save_with_state(Some("F1"), None).await.is_none());
    assert_eq!(ws.active_flow(), None);
    Ok(())
}
