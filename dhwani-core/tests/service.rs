use dhwani_core::error::SynthesisError;
use dhwani_core::request::RawRequest;
use dhwani_core::service::SynthesisService;

mod fixture;
use fixture::Fixture;

fn raw(text: &str, language: &str, gender: &str) -> RawRequest {
    RawRequest {
        text: Some(text.to_string()),
        language: Some(language.to_string()),
        gender: Some(gender.to_string()),
        alpha: None,
    }
}

#[tokio::test]
async fn synthesizes_end_to_end() {
    let fixture = Fixture::with_worker(r#"printf 'RIFFaudio' > "$OUTPUT""#);
    let service = SynthesisService::new(&fixture.config).unwrap();

    let output = service
        .synthesize(raw("namaste duniya", "hindi", "female"))
        .await
        .unwrap();

    assert!(output.file_name.starts_with("output_hindi_female_"));
    assert!(output.path.exists());
    assert!(std::fs::metadata(&output.path).unwrap().len() > 0);
    assert!(fixture.worker_was_invoked());
}

#[tokio::test]
async fn empty_text_fails_validation_without_spawning() {
    let fixture = Fixture::with_worker(r#"printf x > "$OUTPUT""#);
    let service = SynthesisService::new(&fixture.config).unwrap();

    let err = service
        .synthesize(raw("", "hindi", "female"))
        .await
        .unwrap_err();

    assert!(matches!(err, SynthesisError::Validation(_)));
    assert!(!fixture.worker_was_invoked());
}

#[tokio::test]
async fn unknown_language_fails_preflight_without_spawning() {
    let fixture = Fixture::with_worker(r#"printf x > "$OUTPUT""#);
    let service = SynthesisService::new(&fixture.config).unwrap();

    let err = service
        .synthesize(raw("nuqneH", "klingon", "male"))
        .await
        .unwrap_err();

    assert!(matches!(err, SynthesisError::ResourceNotFound { .. }));
    assert!(!fixture.worker_was_invoked());
}

#[tokio::test]
async fn worker_exceeding_deadline_reports_timeout() {
    let fixture = Fixture::with_worker("sleep 30");
    let service = SynthesisService::new(&fixture.config).unwrap();

    let err = service
        .synthesize(raw("slow text", "hindi", "female"))
        .await
        .unwrap_err();

    assert!(matches!(err, SynthesisError::TimedOut));
}

#[tokio::test]
async fn clean_exit_without_output_reports_artifact_missing() {
    let fixture = Fixture::with_worker(":");
    let service = SynthesisService::new(&fixture.config).unwrap();

    let err = service
        .synthesize(raw("hello", "hindi", "female"))
        .await
        .unwrap_err();

    assert!(matches!(err, SynthesisError::ArtifactMissing));
}

#[tokio::test]
async fn worker_failure_carries_exit_code_and_stderr() {
    let fixture = Fixture::with_worker("echo model blew up >&2; exit 5");
    let service = SynthesisService::new(&fixture.config).unwrap();

    let err = service
        .synthesize(raw("hello", "hindi", "female"))
        .await
        .unwrap_err();

    match err {
        SynthesisError::ProcessFailed {
            exit_code,
            stderr_tail,
        } => {
            assert_eq!(exit_code, 5);
            assert!(stderr_tail.contains("model blew up"));
        }
        other => panic!("expected ProcessFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_requests_get_distinct_artifacts() {
    let fixture = Fixture::with_worker(r#"printf 'RIFFaudio' > "$OUTPUT""#);
    let service = std::sync::Arc::new(SynthesisService::new(&fixture.config).unwrap());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .synthesize(raw("same text", "hindi", "female"))
                .await
                .unwrap()
        }));
    }

    let mut names = std::collections::HashSet::new();
    for handle in handles {
        let output = handle.await.unwrap();
        assert!(names.insert(output.file_name), "artifact path reused");
    }
}
