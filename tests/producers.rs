use httpmock::prelude::*;
use installer_genie::config::{ConfigEdit, ConfigEditor, ValidatedConfig};
use installer_genie::producer::{
    ArtifactKind, ArtifactProducer, BundleProducer, GenerativeProducer, ScriptProducer, sha256_hex,
    bundle::{INDEX_FILE, MAIN_FILE, MANIFEST_FILE},
    generative::{GenerationError, GenerationTier, RetryConfig, TextGenerationClient},
    script::{SCRIPT_FILE_NAME, validate_script},
};
use serde_json::json;
use std::time::Duration;

const CONFORMING: &str = "[Setup]\nAppName=Drive\nWizardStyle=modern\nOutputBaseFilename=drive-setup\n";

fn config(edits: Vec<ConfigEdit>) -> ValidatedConfig {
    let mut editor = ConfigEditor::new();
    editor.apply_all(edits);
    editor.freeze().unwrap()
}

fn tiers(models: &[&str]) -> RetryConfig {
    RetryConfig {
        tiers: models
            .iter()
            .map(|m| GenerationTier::new(*m, 0, Duration::from_millis(1)))
            .collect(),
        backoff_multiplier: 2.0,
        max_delay: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn script_and_bundle_are_deterministic() {
    let config = config(vec![ConfigEdit::AppName("Drive \"Pro\"".into())]);

    let first = ScriptProducer::default().produce(&config).await.unwrap();
    let second = ScriptProducer::default().produce(&config).await.unwrap();
    assert_eq!(first, second);

    let first = BundleProducer::default().produce(&config).await.unwrap();
    let second = BundleProducer::default().produce(&config).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.kind, ArtifactKind::Bundle);
}

#[tokio::test]
async fn written_script_carries_bom_and_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = ScriptProducer::default().produce(&config(vec![])).await.unwrap();

    let written = artifact.write_to(dir.path()).await.unwrap();

    let bytes = std::fs::read(dir.path().join(SCRIPT_FILE_NAME)).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].size, bytes.len() as u64);
    assert_eq!(written[0].sha256, sha256_hex(&bytes));
    assert!(validate_script(std::str::from_utf8(&bytes[3..]).unwrap()).is_ok());
}

#[tokio::test]
async fn bundle_files_land_in_the_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = BundleProducer::default().produce(&config(vec![])).await.unwrap();

    artifact.write_to(dir.path()).await.unwrap();

    for name in [MANIFEST_FILE, MAIN_FILE, INDEX_FILE] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }
    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(manifest["main"], MAIN_FILE);
}

#[tokio::test]
async fn generation_falls_back_to_the_next_tier() {
    let server = MockServer::start_async().await;
    let overloaded = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/models/pro:generateContent")
                .header("x-goog-api-key", "secret");
            then.status(503)
                .json_body(json!({ "error": { "message": "The model is overloaded." } }));
        })
        .await;
    let answered = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1beta/models/flash:generateContent");
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [{ "text": format!("```iss\n{CONFORMING}```") }] } }]
            }));
        })
        .await;

    let client = TextGenerationClient::new(server.base_url(), Some("secret".into())).unwrap();
    let producer = GenerativeProducer::new(client, tiers(&["pro", "flash"]));

    let artifact = producer.produce(&config(vec![])).await.unwrap();

    overloaded.assert_hits_async(1).await;
    answered.assert_hits_async(1).await;
    assert_eq!(artifact.files[0].contents, CONFORMING);
    assert!(artifact.files[0].bom);
}

#[tokio::test]
async fn rejected_key_stops_without_fallback() {
    let server = MockServer::start_async().await;
    let denied = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1beta/models/pro:generateContent");
            then.status(403)
                .json_body(json!({ "error": { "message": "API key not valid" } }));
        })
        .await;
    let fallback = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1beta/models/flash:generateContent");
            then.status(200);
        })
        .await;

    let client = TextGenerationClient::new(server.base_url(), Some("bad".into())).unwrap();
    let producer = GenerativeProducer::new(client, tiers(&["pro", "flash"]));

    let failure = producer.generate(&config(vec![])).await.unwrap_err();

    denied.assert_hits_async(1).await;
    fallback.assert_hits_async(0).await;
    assert_eq!(failure.attempts, 1);
    assert!(
        matches!(&failure.last, GenerationError::Status { status: 403, message } if message == "API key not valid")
    );
}

#[tokio::test]
async fn non_conforming_output_exhausts_with_a_friendly_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [{ "text": "[Setup]\nWizardStyle=classic\n" }] } }]
            }));
        })
        .await;

    let client = TextGenerationClient::new(server.base_url(), Some("k".into())).unwrap();
    let producer = GenerativeProducer::new(client, tiers(&["pro", "flash"]));

    let failure = producer.generate(&config(vec![])).await.unwrap_err();

    assert_eq!(failure.attempts, 2);
    assert!(matches!(failure.last, GenerationError::InvalidOutput(_)));
    assert!(failure.friendly_message().starts_with("服务调用失败"));
}
