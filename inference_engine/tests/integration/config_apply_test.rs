//! Exercises the three one-shot CLI use cases against one real config file
//! and one real on-disk model version directory, the way `model_server`
//! itself would be invoked for `validate-config`/`show-model`/`show-pipeline`.

use std::path::PathBuf;

use inference_engine::application::use_cases::{ShowModelUseCase, ShowPipelineUseCase, ValidateConfigUseCase};

fn scratch_dir(case: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("inference_engine_config_apply_test_{case}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("model").join("1")).unwrap();
    dir
}

fn write_config(dir: &std::path::Path, include_model: bool) -> PathBuf {
    let model_path = dir.join("model");
    let models_section = if include_model {
        format!(
            r#"models:
  - name: dummy
    base_path: "{model_path}"
    device: CPU
    batch: Auto
    nireq: 4
    shape_overrides: {{}}
    layout_overrides: {{}}
    plugin_config: {{}}
    version_policy: all
    stateful: false
"#,
            model_path = model_path.to_str().unwrap(),
        )
    } else {
        "models: []\n".to_string()
    };
    let rest = r#"pipelines:
  - name: infer
    inputs: [x]
    nodes:
      - kind: Entry
        name: e
        model_name: null
        model_version: null
        output_aliases: {}
        demultiply_count: null
        gather_from: null
      - kind: Dl
        name: d
        model_name: dummy
        model_version: 0
        output_aliases: {}
        demultiply_count: null
        gather_from: null
      - kind: Exit
        name: x
        model_name: null
        model_version: null
        output_aliases: {}
        demultiply_count: null
        gather_from: null
    connections:
      - to_node: d
        from_node: e
        from_output: x
        to_input: b
      - to_node: x
        from_node: d
        from_output: a
        to_input: result
    outputs: []
custom_loaders: []
"#;
    let config = format!("{models_section}{rest}");
    let config_path = dir.join("config.yaml");
    std::fs::write(&config_path, config).unwrap();
    config_path
}

#[tokio::test]
async fn validate_show_model_and_show_pipeline_agree_on_one_config() {
    let dir = scratch_dir("agree");
    let config_path = write_config(&dir, true);

    ValidateConfigUseCase::new().execute(config_path.clone()).await.expect("config should validate");
    ShowModelUseCase::new().execute("dummy".to_string(), config_path.clone()).await.expect("model should be found");
    ShowPipelineUseCase::new().execute("infer".to_string(), config_path.clone()).await.expect("pipeline should validate");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn show_pipeline_reports_failure_for_a_pipeline_referencing_an_unconfigured_model() {
    let dir = scratch_dir("bad-model");
    // The pipeline still names 'dummy', but no models are configured at all.
    let config_path = write_config(&dir, false);

    let err = ShowPipelineUseCase::new().execute("infer".to_string(), config_path.clone()).await.unwrap_err();
    assert!(err.to_string().contains("FAILED") || err.to_string().to_lowercase().contains("model"));

    let _ = std::fs::remove_dir_all(&dir);
}
