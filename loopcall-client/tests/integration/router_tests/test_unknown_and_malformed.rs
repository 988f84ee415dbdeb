use loopcall_client::{Dispatch, RouterError};

use crate::integration::{create_test_router, init_tracing};
use crate::utils::{MockPlatform, MockUi};

#[tokio::test]
async fn test_unknown_type_is_ignored() {
    init_tracing();

    let ui = MockUi::new();
    let (mut router, signaling) = create_test_router(MockPlatform::new(), ui.clone());

    let dispatch = router
        .process_signaling_message(r#"{"type":"BYE","reason":"later"}"#)
        .await;

    assert_eq!(dispatch, Some(Dispatch::Ignored));
    assert!(signaling.sent().await.is_empty());
    assert_eq!(ui.transcript().content(), "");
    assert!(ui.rooms().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_dropped() {
    init_tracing();

    let ui = MockUi::new();
    let (mut router, _signaling) = create_test_router(MockPlatform::new(), ui.clone());

    for text in [
        "not json",
        r#"{"value":"no type"}"#,
        r#"{"type":"CHATMSG"}"#,
        r#"{"type":"candidate","label":"zero","candidate":"c"}"#,
    ] {
        assert_eq!(router.process_signaling_message(text).await, None, "{text}");
    }

    let err = router.try_process("{").await.unwrap_err();
    assert!(matches!(err, RouterError::Message(_)));
    assert_eq!(ui.transcript().content(), "");
}

#[tokio::test]
async fn test_router_keeps_working_after_bad_message() {
    init_tracing();

    let ui = MockUi::new();
    let (mut router, _signaling) = create_test_router(MockPlatform::new(), ui.clone());

    router.process_signaling_message("][").await;
    let dispatch = router
        .process_signaling_message(r#"{"type":"CHATMSG","value":"still here"}"#)
        .await;

    assert_eq!(dispatch, Some(Dispatch::ChatAppended));
    assert_eq!(ui.transcript().content(), "still here");
}

#[tokio::test]
async fn test_candidate_without_session_is_dropped() {
    init_tracing();

    let (mut router, _signaling) = create_test_router(MockPlatform::new(), MockUi::new());

    let err = router
        .try_process(r#"{"type":"candidate","label":0,"id":"0","candidate":"candidate:1"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::NoSession));
}
