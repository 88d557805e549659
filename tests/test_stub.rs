use native_notify::*;

#[tokio::test]
async fn stub_reports_unavailable() {
    let stub = StubNotifier::new();

    assert!(!stub.is_available());
    assert!(!stub.request_permission().await);
    assert_eq!(stub.get_permission_status().await, PermissionStatus::Denied);
}

#[tokio::test]
async fn stub_show_fails_for_any_input() {
    let stub = StubNotifier::new();
    let inputs = [
        NotificationRequest::new("Hello").with_identifier("id-1"),
        NotificationRequest::default(),
        NotificationRequest::new("Image").with_content_image("/nope.png"),
    ];

    for input in inputs {
        let callback: ClickCallback = Box::new(|_, _| panic!("stub must never call back"));
        let result = match stub.show_notification(input, Some(callback)) {
            Ok(future) => future.await,
            Err(error) => panic!("stub must not reject input: {error}"),
        };
        assert_eq!(
            result,
            NotificationResult::failed("Native notifications not available on this platform")
        );
    }
}

#[test]
fn stub_removals_are_noops() {
    let stub = StubNotifier::new();
    stub.remove_notification("anything");
    stub.remove_notification("");
    stub.remove_all_notifications();

    assert_eq!(
        tokio_test::block_on(stub.get_permission_status()),
        PermissionStatus::Denied
    );
}

#[test]
fn stub_result_matches_host_shape() {
    let result = NotificationResult::failed(UNAVAILABLE_MESSAGE);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "success": false,
            "error": "Native notifications not available on this platform"
        })
    );
}

#[cfg(not(target_os = "macos"))]
#[tokio::test]
async fn loader_falls_back_to_stub_off_macos() -> anyhow::Result<()> {
    assert!(!PlatformBackendFactory::platform_supported());
    assert!(matches!(
        PlatformBackendFactory::try_create_backend(NotifierConfig::default()),
        Err(NotifyError::Platform { .. })
    ));

    let notifier = load_notifier();
    assert!(!notifier.is_available());
    let result = notifier
        .show_notification(NotificationRequest::new("Hi"), None)?
        .await;
    assert!(!result.success);
    Ok(())
}
