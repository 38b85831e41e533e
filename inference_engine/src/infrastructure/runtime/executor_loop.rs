// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline executor loop (C12, §4.12)
//!
//! One event queue `(node, session_key)` per request. A single consumer
//! task drains it; DL-node dispatch is handed to a spawned task so the
//! consumer never blocks on slot acquisition or backend inference, matching
//! the "tasks + an event queue, not thread-per-request" requirement. Slot
//! waits that would otherwise block on `ModelInstance::wait_for_available`'s
//! std `Condvar` are done with a zero timeout on a blocking thread; a
//! not-yet-available instance re-queues itself after a short backoff rather
//! than parking the consumer.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use inference_engine_domain::aggregates::model_instance::AvailableOutcome;
use inference_engine_domain::aggregates::{ModelInstance, Pipeline};
use inference_engine_domain::entities::node::Node;
use inference_engine_domain::entities::node_info::DemultiplyCount;
use inference_engine_domain::entities::node_session::{NodeSession, NodeSessionStatus};
use inference_engine_domain::entities::node_session_metadata::NodeSessionMetadata;
use inference_engine_domain::entities::NodeKind;
use inference_engine_domain::value_objects::{ModelName, ModelVersion, NodeName, RequestId, Tensor};
use inference_engine_domain::EngineError;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

/// Resolves a DL node's model binding to a live instance. Implemented by the
/// engine's model registry (`application::services::model_registry`); kept
/// as a narrow port here so the executor doesn't depend on the registry's
/// own locking scheme.
pub trait ModelLookup: Send + Sync {
    fn resolve(&self, name: &ModelName, version: ModelVersion) -> Option<Arc<ModelInstance>>;
}

#[derive(Debug, Clone)]
struct Event {
    node: NodeName,
    session_key: String,
}

type SessionMap = HashMap<(NodeName, String), NodeSession>;

pub struct PipelineExecutor {
    slot_timeout: Duration,
    infer_timeout: Duration,
    defer_backoff: Duration,
}

impl PipelineExecutor {
    pub fn new(slot_timeout: Duration, infer_timeout: Duration) -> Self {
        Self { slot_timeout, infer_timeout, defer_backoff: Duration::from_micros(500) }
    }

    /// Runs one request through `pipeline` end to end (§4.8 `Pipeline::execute`).
    pub async fn execute(
        &self,
        pipeline: Arc<Pipeline>,
        models: Arc<dyn ModelLookup>,
        request_id: RequestId,
        inputs: BTreeMap<String, Tensor>,
    ) -> Result<BTreeMap<String, Tensor>, EngineError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let sessions: Arc<AsyncMutex<SessionMap>> = Arc::new(AsyncMutex::new(HashMap::new()));

        let entry = pipeline.entry();
        let root_meta = NodeSessionMetadata::root(request_id);
        let mut entry_session = NodeSession::new(entry.name.clone(), root_meta, NodeKind::Entry, 0);
        entry_session.complete(inputs);
        let entry_key = entry_session.session_key();
        let entry_outputs = entry_session.outputs().cloned().unwrap_or_default();
        let entry_meta = entry_session.metadata().clone();
        sessions.lock().await.insert((entry.name.clone(), entry_key.clone()), entry_session);

        self.propagate(&pipeline, entry, &entry_meta, &entry_outputs, &sessions, &tx).await?;

        loop {
            let event = rx.recv().await.ok_or_else(|| {
                EngineError::internal_error("executor event queue closed before the exit session completed")
            })?;

            let node = pipeline
                .node(&event.node)
                .ok_or_else(|| EngineError::PipelineNodeReferingToMissingNode(event.node.to_string()))?;

            if node.is_exit() {
                let guard = sessions.lock().await;
                if let Some(session) = guard.get(&(event.node.clone(), event.session_key.clone())) {
                    if matches!(session.status(), NodeSessionStatus::Completed) {
                        return Ok(session.outputs().cloned().unwrap_or_default());
                    }
                    if let Some(err) = session.error() {
                        return Err(err.clone());
                    }
                }
                continue;
            }

            // Gather is a data operation, not a backend dispatch (§4.7): join shards
            // synchronously and propagate, even for a node that is otherwise `Dl`.
            if node.is_gather() {
                self.handle_gather(&pipeline, node, event, &sessions, &tx).await?;
                continue;
            }

            if node.is_dl() {
                self.dispatch_dl(pipeline.clone(), node.clone(), event, models.clone(), sessions.clone(), tx.clone())
                    .await?;
            }
        }
    }

    /// Concatenates every collected shard for one input along its leading
    /// axis and completes the session immediately (§4.7 "Gather").
    async fn handle_gather(
        &self,
        pipeline: &Pipeline,
        node: &Node,
        event: Event,
        sessions: &Arc<AsyncMutex<SessionMap>>,
        tx: &mpsc::UnboundedSender<Event>,
    ) -> Result<(), EngineError> {
        let key = (event.node.clone(), event.session_key.clone());
        let (meta, outputs) = {
            let mut guard = sessions.lock().await;
            let Some(session) = guard.get_mut(&key) else { return Ok(()) };
            if !session.is_ready() {
                return Ok(());
            }

            let mut by_input: BTreeMap<String, Vec<(u64, Tensor)>> = BTreeMap::new();
            for ((input_name, shard_id), tensor) in session.collected_inputs() {
                by_input.entry(input_name.clone()).or_default().push((shard_id.unwrap_or(0), tensor.clone()));
            }

            let mut outputs = BTreeMap::new();
            for (input_name, mut shards) in by_input {
                shards.sort_by_key(|(id, _)| *id);
                let tensors: Vec<Tensor> = shards.into_iter().map(|(_, t)| t).collect();
                outputs.insert(input_name, Tensor::gather(&tensors)?);
            }

            session.complete(outputs.clone());
            (session.metadata().clone(), outputs)
        };

        Self::propagate_static(pipeline, node, &meta, &outputs, sessions, tx).await
    }

    /// Resolves the target model, acquires availability, dispatches
    /// inference on a spawned task, and re-queues the event after a short
    /// backoff if no version is available yet (§4.7 DLNode "may defer").
    async fn dispatch_dl(
        &self,
        pipeline: Arc<Pipeline>,
        node: Node,
        event: Event,
        models: Arc<dyn ModelLookup>,
        sessions: Arc<AsyncMutex<SessionMap>>,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Result<(), EngineError> {
        let key = (event.node.clone(), event.session_key.clone());
        {
            let guard = sessions.lock().await;
            let Some(session) = guard.get(&key) else { return Ok(()) };
            if !matches!(session.status(), NodeSessionStatus::Ready) {
                return Ok(());
            }
        }

        let model_name = node
            .model_name
            .clone()
            .ok_or_else(|| EngineError::PipelineNodeReferingToMissingModel(node.name.to_string()))?;
        let model_version = node.model_version.unwrap_or(ModelVersion::DEFAULT);
        let Some(instance) = models.resolve(&model_name, model_version) else {
            return Err(EngineError::ModelVersionNotLoadedYet(model_name.to_string()));
        };

        // A zero deadline never reaches the condvar wait inside
        // `wait_for_available` (the elapsed-vs-deadline check is already true
        // on the first pass), so it only ever takes a brief std Mutex lock -
        // cheap enough to call inline rather than round-trip the blocking pool.
        let token = instance.wait_for_available(Duration::ZERO);

        let available = match token {
            AvailableOutcome::Available(token) => token,
            AvailableOutcome::NotLoadedAnymore => {
                return Err(EngineError::ModelVersionNotLoadedAnymore(model_name.to_string()))
            }
            AvailableOutcome::NotLoadedYet => {
                let backoff = self.defer_backoff;
                tokio::spawn(async move {
                    tokio::time::sleep(backoff).await;
                    let _ = tx.send(event);
                });
                return Ok(());
            }
        };

        {
            let mut guard = sessions.lock().await;
            if let Some(session) = guard.get_mut(&key) {
                session.mark_dispatched();
            }
        }

        let slot_timeout = self.slot_timeout;
        let infer_timeout = self.infer_timeout;
        let output_names: Vec<String> = instance.outputs().iter().map(|t| t.name.clone()).collect();
        tokio::spawn(async move {
            let inputs = {
                let guard = sessions.lock().await;
                guard
                    .get(&key)
                    .map(|s| s.collected_inputs().iter().map(|((name, _), t)| (name.clone(), t.clone())).collect())
                    .unwrap_or_else(BTreeMap::new)
            };

            let result = instance.infer(inputs, Some(&output_names), slot_timeout, infer_timeout).await;
            drop(available);

            let (meta, outputs) = {
                let mut guard = sessions.lock().await;
                let Some(session) = guard.get_mut(&key) else { return };
                match result {
                    Ok(outputs) => {
                        session.complete(outputs.clone());
                        (session.metadata().clone(), outputs)
                    }
                    Err(err) => {
                        // The failing node's own session has no reader (the main loop
                        // only inspects `session.error()` on the exit node's session),
                        // so a dispatch failure has to be recorded there directly or
                        // `execute()` blocks on `rx.recv()` forever.
                        let root_meta = NodeSessionMetadata::root(session.metadata().request_id().clone());
                        session.fail(err.clone());
                        let exit_node = pipeline.exit();
                        let exit_key = (exit_node.name.clone(), root_meta.session_key());
                        let exit_session = guard.entry(exit_key.clone()).or_insert_with(|| {
                            NodeSession::new(exit_node.name.clone(), root_meta.clone(), exit_node.kind, 0)
                        });
                        if exit_session.error().is_none() && !matches!(exit_session.status(), NodeSessionStatus::Completed) {
                            exit_session.fail(err);
                        }
                        let _ = tx.send(Event { node: exit_key.0, session_key: exit_key.1 });
                        return;
                    }
                }
            };

            let _ = Self::propagate_static(&pipeline, &node, &meta, &outputs, &sessions, &tx).await;
        });

        Ok(())
    }

    async fn propagate(
        &self,
        pipeline: &Pipeline,
        node: &Node,
        meta: &NodeSessionMetadata,
        outputs: &BTreeMap<String, Tensor>,
        sessions: &Arc<AsyncMutex<SessionMap>>,
        tx: &mpsc::UnboundedSender<Event>,
    ) -> Result<(), EngineError> {
        Self::propagate_static(pipeline, node, meta, outputs, sessions, tx).await
    }

    /// Publishes `node`'s outputs to every dependant, splitting into shards
    /// first if `node` is a demultiplex node (§4.7).
    async fn propagate_static(
        pipeline: &Pipeline,
        node: &Node,
        meta: &NodeSessionMetadata,
        outputs: &BTreeMap<String, Tensor>,
        sessions: &Arc<AsyncMutex<SessionMap>>,
        tx: &mpsc::UnboundedSender<Event>,
    ) -> Result<(), EngineError> {
        let shards: Option<(u64, BTreeMap<String, Vec<Tensor>>)> = if let Some(count) = node.demultiply_count {
            let k = match count {
                DemultiplyCount::Fixed(n) => n,
                DemultiplyCount::Any => {
                    let any_output =
                        outputs.values().next().ok_or_else(|| EngineError::invalid_shape("demultiplex node produced no outputs"))?;
                    *any_output.dims().first().unwrap_or(&1)
                }
            };
            let mut per_output = BTreeMap::new();
            for (name, tensor) in outputs {
                per_output.insert(name.clone(), tensor.demultiplex(k)?);
            }
            Some((k, per_output))
        } else {
            None
        };

        for dependant_name in &node.dependants {
            let Some(dependant) = pipeline.node(dependant_name) else { continue };
            let bindings: Vec<_> = dependant.inputs.iter().filter(|b| &b.from_node == &node.name).collect();

            // A gather node consolidates shards back into its upstream demultiplex
            // ancestor's session scope: pop that ancestor's frame rather than
            // create one session per shard.
            if let Some(gather_from) = &dependant.gather_from {
                if let Some(ancestor) = gather_from.first() {
                    if let Ok((restored_meta, frame)) = meta.pop_frame(ancestor) {
                        let mut guard = sessions.lock().await;
                        let key = (dependant.name.clone(), restored_meta.session_key());
                        let expected = frame.total_shards as usize * bindings.len().max(1);
                        let session = guard.entry(key.clone()).or_insert_with(|| {
                            NodeSession::new(dependant.name.clone(), restored_meta.clone(), dependant.kind, expected)
                        });
                        for binding in &bindings {
                            if let Some(tensor) = outputs.get(&binding.from_output) {
                                session.offer_input(binding.to_input.clone(), Some(frame.shard_id), tensor.clone());
                            }
                        }
                        if session.is_ready() {
                            let _ = tx.send(Event { node: dependant.name.clone(), session_key: key.1.clone() });
                        }
                        continue;
                    }
                }
            }

            match &shards {
                None => {
                    let mut guard = sessions.lock().await;
                    let key = (dependant.name.clone(), meta.session_key());
                    let session = guard.entry(key.clone()).or_insert_with(|| {
                        NodeSession::new(dependant.name.clone(), meta.clone(), dependant.kind, dependant.input_count())
                    });
                    for binding in &bindings {
                        if let Some(tensor) = outputs.get(&binding.from_output) {
                            session.offer_input(binding.to_input.clone(), None, tensor.clone());
                        }
                    }
                    if session.is_ready() {
                        let _ = tx.send(Event { node: dependant.name.clone(), session_key: key.1.clone() });
                    }
                }
                Some((k, per_output)) => {
                    for shard_id in 0..*k {
                        let child_meta = meta.push_frame(node.name.clone(), shard_id, *k);
                        let mut guard = sessions.lock().await;
                        let key = (dependant.name.clone(), child_meta.session_key());
                        let session = guard.entry(key.clone()).or_insert_with(|| {
                            NodeSession::new(dependant.name.clone(), child_meta.clone(), dependant.kind, dependant.input_count())
                        });
                        for binding in &bindings {
                            if let Some(shards) = per_output.get(&binding.from_output) {
                                session.offer_input(binding.to_input.clone(), Some(shard_id), shards[shard_id as usize].clone());
                            }
                        }
                        if session.is_ready() {
                            let _ = tx.send(Event { node: dependant.name.clone(), session_key: key.1.clone() });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
