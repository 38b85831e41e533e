// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Predict use case (§2, §4.11, §6)
//!
//! The `Client -> RequestValidator -> (ModelInstance | Pipeline)` data flow:
//! resolves the request's target as a model or a pipeline, decodes any
//! binary inputs, runs `validate_request` + `decide` for a model target
//! (reshaping the instance first if the decision calls for it), and hands
//! off to `ModelInstance::infer` or `PipelineExecutor::execute`.
//!
//! Every `EngineError` this use case can produce maps to a wire
//! [`StatusCode`] (`EngineError::status_code`), so `execute` is infallible:
//! a caller-visible failure comes back as `PredictResponse::error(status)`
//! rather than an `Err`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use inference_engine_domain::aggregates::model_instance::AvailableOutcome;
use inference_engine_domain::aggregates::ModelInstance;
use inference_engine_domain::repositories::backend::ShapeMode;
use inference_engine_domain::repositories::image_decoder::ImageDecoder;
use inference_engine_domain::services::{decide, validate_request, ReshapeDecision};
use inference_engine_domain::value_objects::{
    ModelName, PipelineName, PredictRequest, PredictResponse, RequestId, RequestInput, Shape, StatusCode, Tensor,
};
use inference_engine_domain::EngineError;

use crate::application::services::{ModelRegistry, PipelineRegistry};
use crate::infrastructure::decoding::StubImageDecoder;
use crate::infrastructure::runtime::PipelineExecutor;

pub struct PredictUseCase {
    decoder: Arc<dyn ImageDecoder>,
    slot_timeout: Duration,
    infer_timeout: Duration,
}

impl PredictUseCase {
    pub fn new(slot_timeout: Duration, infer_timeout: Duration) -> Self {
        Self { decoder: Arc::new(StubImageDecoder::new()), slot_timeout, infer_timeout }
    }

    /// Resolves `request.target_name` against the model registry first, the
    /// pipeline registry second, runs the appropriate serving path, and
    /// normalizes any failure into a response status (§6/§7).
    pub async fn execute(
        &self,
        model_registry: &Arc<ModelRegistry>,
        pipeline_registry: &Arc<PipelineRegistry>,
        executor: &PipelineExecutor,
        request_id: RequestId,
        request: PredictRequest,
    ) -> PredictResponse {
        match self.execute_inner(model_registry, pipeline_registry, executor, request_id, request).await {
            Ok(response) => response,
            Err(err) => PredictResponse::error(err.status_code()),
        }
    }

    async fn execute_inner(
        &self,
        model_registry: &Arc<ModelRegistry>,
        pipeline_registry: &Arc<PipelineRegistry>,
        executor: &PipelineExecutor,
        request_id: RequestId,
        request: PredictRequest,
    ) -> Result<PredictResponse, EngineError> {
        if request.target_name.trim().is_empty() {
            return Err(EngineError::ModelNameMissing);
        }

        let inputs = self.decode_inputs(request.inputs)?;

        if let Ok(model_name) = ModelName::new(request.target_name.clone()) {
            if let Some(model) = model_registry.get(&model_name) {
                return self
                    .predict_model(model_registry, &model, &model_name, request.target_version, inputs, request.requested_outputs.as_deref())
                    .await;
            }
        }

        let pipeline_name = PipelineName::new(request.target_name.clone())?;
        let pipeline = pipeline_registry.create_pipeline(&pipeline_name)?;
        let models: Arc<dyn crate::infrastructure::runtime::executor_loop::ModelLookup> = model_registry.clone();
        let outputs = executor.execute(Arc::new(pipeline), models, request_id, inputs).await?;
        Ok(PredictResponse::ok(outputs))
    }

    /// §4.4 steps 1-2 (validate, reshape-on-demand) followed by steps 3-7
    /// (`ModelInstance::infer`), for a request targeting a model directly
    /// rather than a pipeline.
    async fn predict_model(
        &self,
        model_registry: &Arc<ModelRegistry>,
        model: &Arc<inference_engine_domain::aggregates::Model>,
        model_name: &ModelName,
        version: inference_engine_domain::value_objects::ModelVersion,
        inputs: BTreeMap<String, Tensor>,
        requested_outputs: Option<&[String]>,
    ) -> Result<PredictResponse, EngineError> {
        let instance = match model.get(version) {
            Some(instance) => instance,
            None => return Ok(PredictResponse::error(StatusCode::ModelVersionNotLoadedYet)),
        };

        let model_inputs = instance.inputs();
        let (shape_auto_inputs, batch_auto) = model_registry.validation_params(model_name);
        let outcome = validate_request(&inputs, &model_inputs, &shape_auto_inputs, batch_auto);

        match decide(outcome, !shape_auto_inputs.is_empty()) {
            ReshapeDecision::Reject(err) => return Ok(PredictResponse::error(err.status_code())),
            // BatchMode::Auto means the compiled model already accepts a varying
            // batch size with no recompile (unlike a shape-auto input, which
            // needs ModelInstance::reshape) - serve directly in both cases.
            ReshapeDecision::Serve | ReshapeDecision::ChangeBatchThenServe { .. } => {}
            ReshapeDecision::ReshapeThenServe { input, new_dims } => {
                let mut overrides = model_registry.shape_overrides_for(model_name);
                overrides.insert(input, ShapeMode::Fixed(Shape::concrete(new_dims)));
                model_registry.reshape_instance(&instance, overrides).await?;
            }
        }

        let available = self.acquire(&instance).await?;
        let outcome = match available {
            AvailableOutcome::Available(token) => token,
            AvailableOutcome::NotLoadedYet => return Ok(PredictResponse::error(StatusCode::ModelVersionNotLoadedYet)),
            AvailableOutcome::NotLoadedAnymore => return Ok(PredictResponse::error(StatusCode::ModelVersionNotLoadedAnymore)),
        };

        let outputs = instance.infer(inputs, requested_outputs, self.slot_timeout, self.infer_timeout).await?;
        drop(outcome);
        Ok(PredictResponse::ok(outputs))
    }

    /// `wait_for_available` parks on a std `Condvar`; run it on the blocking
    /// pool so it doesn't park a tokio worker, same reasoning as
    /// `ModelRegistry::reload_instance`.
    async fn acquire(&self, instance: &Arc<ModelInstance>) -> Result<AvailableOutcome, EngineError> {
        let instance = instance.clone();
        let deadline = self.slot_timeout;
        tokio::task::spawn_blocking(move || instance.wait_for_available(deadline))
            .await
            .map_err(|e| EngineError::internal_error(e.to_string()))
    }

    /// Consumes `raw` in key order so the first binary item sets the
    /// request's shared resolution and every later one decodes against it
    /// (§4.11): "all binary items must share resolution when the layout is
    /// unknown."
    fn decode_inputs(&self, raw: BTreeMap<String, RequestInput>) -> Result<BTreeMap<String, Tensor>, EngineError> {
        let mut shared_resolution: Option<(u32, u32)> = None;
        let mut inputs = BTreeMap::new();

        for (name, value) in raw {
            let tensor = match value {
                RequestInput::Tensor(tensor) => tensor,
                RequestInput::Binary(bytes) => {
                    let tensor = self.decoder.decode(&bytes, shared_resolution)?;
                    if shared_resolution.is_none() {
                        if let [height, width, ..] = tensor.dims() {
                            shared_resolution = Some((*height as u32, *width as u32));
                        }
                    }
                    tensor
                }
            };
            inputs.insert(name, tensor);
        }

        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::backend::DummyBackend;
    use crate::infrastructure::repositories::LocalFileSystemAdapter;
    use crate::infrastructure::runtime::TokioSlotPoolFactory;
    use inference_engine_domain::repositories::config_source::ModelConfigEntry;
    use inference_engine_domain::repositories::backend::BatchMode;
    use inference_engine_domain::value_objects::{ElementType, Nireq, VersionPolicy};
    use std::collections::BTreeSet;

    fn scratch_model_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("inference_engine_predict_test_{}_{name}", std::process::id()));
        std::fs::create_dir_all(dir.join("1")).unwrap();
        dir
    }

    fn entry(name: &str, base_path: &str) -> ModelConfigEntry {
        ModelConfigEntry {
            name: ModelName::new(name).unwrap(),
            base_path: base_path.to_string(),
            device: "CPU".to_string(),
            batch: BatchMode::Fixed(1),
            nireq: Nireq::default(),
            shape_overrides: BTreeMap::new(),
            layout_overrides: BTreeMap::new(),
            plugin_config: BTreeMap::new(),
            version_policy: VersionPolicy::default(),
            stateful: false,
        }
    }

    fn use_case() -> PredictUseCase {
        PredictUseCase::new(Duration::from_millis(200), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn an_empty_target_name_is_rejected() {
        let model_registry = Arc::new(ModelRegistry::new(
            Arc::new(LocalFileSystemAdapter::new()),
            Arc::new(DummyBackend),
            Arc::new(TokioSlotPoolFactory),
        ));
        let pipeline_registry = Arc::new(PipelineRegistry::new(Duration::from_millis(50)));
        let executor = PipelineExecutor::new(Duration::from_millis(50), Duration::from_millis(50));

        let response = use_case()
            .execute(&model_registry, &pipeline_registry, &executor, RequestId::new(), PredictRequest::new(""))
            .await;
        assert_eq!(response.status, StatusCode::ModelNameMissing);
    }

    #[tokio::test]
    async fn an_unknown_target_is_not_loaded_anymore() {
        let model_registry = Arc::new(ModelRegistry::new(
            Arc::new(LocalFileSystemAdapter::new()),
            Arc::new(DummyBackend),
            Arc::new(TokioSlotPoolFactory),
        ));
        let pipeline_registry = Arc::new(PipelineRegistry::new(Duration::from_millis(50)));
        let executor = PipelineExecutor::new(Duration::from_millis(50), Duration::from_millis(50));

        let response = use_case()
            .execute(&model_registry, &pipeline_registry, &executor, RequestId::new(), PredictRequest::new("nope"))
            .await;
        assert_eq!(response.status, StatusCode::PipelineDefinitionNotLoadedAnymore);
    }

    #[tokio::test]
    async fn a_loaded_model_serves_a_matching_request() {
        let dir = scratch_model_dir("serve");
        let model_registry = Arc::new(ModelRegistry::new(
            Arc::new(LocalFileSystemAdapter::new()),
            Arc::new(DummyBackend),
            Arc::new(TokioSlotPoolFactory),
        ));
        model_registry
            .apply_config(&[entry("dummy", dir.to_str().unwrap())], &BTreeSet::new())
            .await
            .unwrap();
        let pipeline_registry = Arc::new(PipelineRegistry::new(Duration::from_millis(50)));
        let executor = PipelineExecutor::new(Duration::from_millis(50), Duration::from_millis(50));

        let request = PredictRequest::new("dummy").with_input(
            "b",
            RequestInput::Tensor(Tensor::new(ElementType::Fp32, vec![1, 10], vec![0u8; 40]).unwrap()),
        );
        let response = use_case().execute(&model_registry, &pipeline_registry, &executor, RequestId::new(), request).await;
        assert_eq!(response.status, StatusCode::Ok);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn the_first_binary_items_resolution_is_propagated_to_the_rest() {
        let use_case = use_case();
        let mut raw = BTreeMap::new();
        raw.insert("a".to_string(), RequestInput::Binary(vec![1, 2, 3]));
        raw.insert("b".to_string(), RequestInput::Binary(vec![4, 5, 6]));

        let decoded = use_case.decode_inputs(raw).unwrap();
        assert_eq!(decoded["a"].dims(), decoded["b"].dims());
    }
}
