use loopcall_client::{MediaView, PeerConnection, PeerEvent, RemoteTrack, TrackKind};
use loopcall_core::PeerId;

use crate::integration::{create_test_router, init_tracing};
use crate::utils::{MockPlatform, MockUi};

fn track(id: PeerId, stream_id: &str, kind: TrackKind) -> PeerEvent {
    PeerEvent::Track(
        id,
        RemoteTrack {
            stream_id: stream_id.into(),
            track_id: kind.to_string(),
            kind,
        },
    )
}

#[tokio::test]
async fn test_remote_stream_attached_once() {
    init_tracing();

    let platform = MockPlatform::new();
    let (mut router, _signaling) = create_test_router(platform.clone(), MockUi::new());
    router.start_session(false).await.unwrap();
    let pc = platform.connection(0);

    router
        .handle_peer_event(track(pc.id(), "remote-1", TrackKind::Audio))
        .await;
    assert_eq!(
        platform.attached(MediaView::Remote),
        vec!["remote-1".to_owned()]
    );
    assert_eq!(router.session().unwrap().remote_stream_id(), Some("remote-1"));

    // Second track of the same stream.
    router
        .handle_peer_event(track(pc.id(), "remote-1", TrackKind::Video))
        .await;
    assert_eq!(
        platform.attached(MediaView::Remote),
        vec!["remote-1".to_owned()]
    );
}

#[tokio::test]
async fn test_track_from_previous_connection_is_dropped() {
    init_tracing();

    let platform = MockPlatform::new();
    let (mut router, _signaling) = create_test_router(platform.clone(), MockUi::new());
    router.start_session(false).await.unwrap();
    let old_id = platform.connection(0).id();

    router.hangup().await;
    router.start_session(false).await.unwrap();
    let new_id = platform.connection(1).id();
    assert_ne!(old_id, new_id);

    router
        .handle_peer_event(track(old_id, "stale", TrackKind::Video))
        .await;
    assert!(platform.attached(MediaView::Remote).is_empty());
    assert_eq!(router.session().unwrap().remote_stream_id(), None);

    router
        .handle_peer_event(track(new_id, "fresh", TrackKind::Video))
        .await;
    assert_eq!(
        platform.attached(MediaView::Remote),
        vec!["fresh".to_owned()]
    );
}

#[tokio::test]
async fn test_track_without_session_is_dropped() {
    init_tracing();

    let platform = MockPlatform::new();
    let (mut router, _signaling) = create_test_router(platform.clone(), MockUi::new());

    router
        .handle_peer_event(track(PeerId::new(), "orphan", TrackKind::Audio))
        .await;
    assert!(platform.attached(MediaView::Remote).is_empty());
}
