//! Drives a real `PipelineExecutor` against a model loaded through
//! `ModelRegistry` and the `DummyBackend` (`a = b + 1`), end to end: a
//! linear entry -> dl -> exit DAG, and a demultiplex/gather DAG that splits
//! a request into shards, runs each through its own dl dispatch, and joins
//! the results back together.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use inference_engine::application::services::ModelRegistry;
use inference_engine::infrastructure::backend::DummyBackend;
use inference_engine::infrastructure::repositories::LocalFileSystemAdapter;
use inference_engine::infrastructure::runtime::{PipelineExecutor, TokioSlotPoolFactory};
use inference_engine_domain::entities::{Connection, DemultiplyCount, NodeInfo, NodeKind};
use inference_engine_domain::repositories::backend::BatchMode;
use inference_engine_domain::repositories::config_source::ModelConfigEntry;
use inference_engine_domain::value_objects::{ElementType, ModelName, ModelVersion, NodeName, Nireq, PipelineName, RequestId, Tensor, VersionPolicy};

fn scratch_model_dir(case: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("inference_engine_pipeline_test_{case}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("1")).unwrap();
    dir
}

fn model_entry(base_path: &str) -> ModelConfigEntry {
    ModelConfigEntry {
        name: ModelName::new("dummy").unwrap(),
        base_path: base_path.to_string(),
        device: "CPU".to_string(),
        batch: BatchMode::Auto,
        nireq: Nireq::clamped(4),
        shape_overrides: BTreeMap::new(),
        layout_overrides: BTreeMap::new(),
        plugin_config: BTreeMap::new(),
        version_policy: VersionPolicy::default(),
        stateful: false,
    }
}

async fn load_dummy_model(base_path: &str) -> Arc<ModelRegistry> {
    let registry = Arc::new(ModelRegistry::new(
        Arc::new(LocalFileSystemAdapter::new()),
        Arc::new(DummyBackend),
        Arc::new(TokioSlotPoolFactory),
    ));
    registry.apply_config(&[model_entry(base_path)], &std::collections::BTreeSet::new()).await.unwrap();
    registry
}

fn f32_tensor(dims: Vec<u64>, values: &[f32]) -> Tensor {
    let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    Tensor::new(ElementType::Fp32, dims, bytes).unwrap()
}

fn to_floats(tensor: &Tensor) -> Vec<f32> {
    tensor.bytes().chunks_exact(4).map(|c| f32::from_le_bytes(c.try_into().unwrap())).collect()
}

fn conn(to: &str, from: &str, from_output: &str, to_input: &str) -> Connection {
    Connection {
        to_node: NodeName::new(to).unwrap(),
        from_node: NodeName::new(from).unwrap(),
        from_output: from_output.to_string(),
        to_input: to_input.to_string(),
    }
}

#[tokio::test]
async fn linear_pipeline_runs_one_request_through_a_live_model() {
    let dir = scratch_model_dir("linear");
    let registry = load_dummy_model(dir.to_str().unwrap()).await;

    let nodes = vec![
        NodeInfo::entry(NodeName::new("e").unwrap()),
        NodeInfo::dl(NodeName::new("d").unwrap(), ModelName::new("dummy").unwrap(), ModelVersion::DEFAULT),
        NodeInfo::exit(NodeName::new("x").unwrap()),
    ];
    let connections = vec![conn("d", "e", "x", "b"), conn("x", "d", "a", "result")];
    let pipeline = Arc::new(inference_engine_domain::aggregates::Pipeline::from_definition(
        PipelineName::new("linear").unwrap(),
        &nodes,
        &connections,
    ));

    let executor = PipelineExecutor::new(Duration::from_secs(5), Duration::from_secs(5));
    let mut inputs = BTreeMap::new();
    inputs.insert("x".to_string(), f32_tensor(vec![1, 10], &(1..=10).map(|n| n as f32).collect::<Vec<_>>()));

    let outputs = tokio::time::timeout(
        Duration::from_secs(10),
        executor.execute(pipeline, registry.clone(), RequestId::new(), inputs),
    )
    .await
    .expect("pipeline did not complete in time")
    .unwrap();

    let result = outputs.get("result").expect("exit node did not produce 'result'");
    assert_eq!(to_floats(result), (2..=11).map(|n| n as f32).collect::<Vec<_>>());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn demultiplex_then_gather_round_trips_through_two_dl_dispatches() {
    let dir = scratch_model_dir("demux");
    let registry = load_dummy_model(dir.to_str().unwrap()).await;

    let nodes = vec![
        NodeInfo::entry(NodeName::new("e").unwrap()),
        NodeInfo::dl(NodeName::new("d1").unwrap(), ModelName::new("dummy").unwrap(), ModelVersion::DEFAULT)
            .with_demultiply(DemultiplyCount::Fixed(2)),
        NodeInfo::dl(NodeName::new("d2").unwrap(), ModelName::new("dummy").unwrap(), ModelVersion::DEFAULT),
        NodeInfo { kind: NodeKind::Dl, gather_from: Some(vec![NodeName::new("d1").unwrap()]), ..NodeInfo::entry(NodeName::new("g").unwrap()) },
        NodeInfo::exit(NodeName::new("x").unwrap()),
    ];
    let connections = vec![
        conn("d1", "e", "x", "b"),
        conn("d2", "d1", "a", "b"),
        conn("g", "d2", "a", "b"),
        conn("x", "g", "b", "result"),
    ];
    let pipeline = Arc::new(inference_engine_domain::aggregates::Pipeline::from_definition(
        PipelineName::new("demux").unwrap(),
        &nodes,
        &connections,
    ));

    let executor = PipelineExecutor::new(Duration::from_secs(5), Duration::from_secs(5));
    let mut inputs = BTreeMap::new();
    let original: Vec<f32> = (1..=20).map(|n| n as f32).collect();
    inputs.insert("x".to_string(), f32_tensor(vec![2, 10], &original));

    let outputs = tokio::time::timeout(
        Duration::from_secs(10),
        executor.execute(pipeline, registry.clone(), RequestId::new(), inputs),
    )
    .await
    .expect("pipeline did not complete in time")
    .unwrap();

    let result = outputs.get("result").expect("exit node did not produce 'result'");
    assert_eq!(result.dims(), &[2, 10]);
    // Each shard is dispatched through d1 then d2, so every element is
    // incremented twice, row order preserved across the split/join.
    assert_eq!(to_floats(result), original.iter().map(|v| v + 2.0).collect::<Vec<_>>());

    let _ = std::fs::remove_dir_all(&dir);
}
