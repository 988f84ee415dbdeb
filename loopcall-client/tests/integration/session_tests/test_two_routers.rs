use std::sync::Arc;

use loopcall_client::{PeerEvent, RouterCommand, RouterExit, SignalingRouter, channel_pair};
use loopcall_core::{IceCandidate, RoomId};
use tokio::sync::mpsc;

use crate::integration::{init_tracing, test_config};
use crate::utils::{MOCK_TIMEOUT_MS, MockPlatform, MockSignalingState, MockUi, wait_for};

async fn wait_for_connections(platform: &Arc<MockPlatform>, count: usize) -> bool {
    wait_for(
        || {
            let platform = platform.clone();
            async move { platform.connections().len() >= count }
        },
        MOCK_TIMEOUT_MS,
    )
    .await
}

#[tokio::test]
async fn test_two_routers_negotiate_and_chat() {
    init_tracing();

    let (caller_link, callee_link) = channel_pair();
    let (caller_platform, callee_platform) = (MockPlatform::new(), MockPlatform::new());
    let (caller_ui, callee_ui) = (MockUi::new(), MockUi::new());

    let caller = SignalingRouter::new(
        caller_platform.clone(),
        Arc::new(caller_link.output),
        Arc::new(caller_ui.clone()),
        test_config(),
    );
    let callee = SignalingRouter::new(
        callee_platform.clone(),
        Arc::new(callee_link.output),
        Arc::new(callee_ui.clone()),
        test_config(),
    );

    let (caller_cmd, caller_cmd_rx) = mpsc::channel(8);
    let (callee_cmd, callee_cmd_rx) = mpsc::channel(8);
    let caller_task = tokio::spawn(caller.run(caller_link.inbound, caller_cmd_rx));
    let callee_task = tokio::spawn(callee.run(callee_link.inbound, callee_cmd_rx));

    for server in [&caller_link.server, &callee_link.server] {
        assert!(server.send_raw(r#"{"type":"GETROOM","value":"7"}"#));
    }

    callee_cmd
        .send(RouterCommand::StartSession { initiator: false })
        .await
        .unwrap();
    assert!(wait_for_connections(&callee_platform, 1).await);

    caller_cmd
        .send(RouterCommand::StartSession { initiator: true })
        .await
        .unwrap();
    assert!(wait_for_connections(&caller_platform, 1).await);

    let caller_pc = caller_platform.connection(0);
    let callee_pc = callee_platform.connection(0);

    let negotiated = wait_for(
        || {
            let (a, b) = (caller_pc.clone(), callee_pc.clone());
            async move {
                a.remote_description().is_some()
                    && b.remote_description().is_some()
                    && a.signaling_state() == MockSignalingState::Stable
                    && b.signaling_state() == MockSignalingState::Stable
            }
        },
        MOCK_TIMEOUT_MS,
    )
    .await;
    assert!(negotiated);
    assert_eq!(
        caller_pc.remote_description().map(|d| d.sdp),
        callee_pc.local_description().map(|d| d.sdp)
    );

    caller_pc
        .emit(|id| PeerEvent::IceCandidate(id, IceCandidate::from_wire(0, "candidate:caller")))
        .await;
    let applied = wait_for(
        || {
            let b = callee_pc.clone();
            async move { b.applied_candidates() == vec!["candidate:caller".to_owned()] }
        },
        MOCK_TIMEOUT_MS,
    )
    .await;
    assert!(applied);

    caller_cmd
        .send(RouterCommand::Chat("hello ".into()))
        .await
        .unwrap();
    callee_cmd
        .send(RouterCommand::Chat("hi back".into()))
        .await
        .unwrap();
    let chatted = wait_for(
        || {
            let (a, b) = (caller_ui.clone(), callee_ui.clone());
            async move {
                a.transcript().content() == "hi back" && b.transcript().content() == "hello "
            }
        },
        MOCK_TIMEOUT_MS,
    )
    .await;
    assert!(chatted);

    assert_eq!(caller_ui.rooms(), vec![RoomId::from("7")]);
    assert_eq!(callee_ui.rooms(), vec![RoomId::from("7")]);

    // The server rejects the caller; only the caller leaves.
    assert!(caller_link.server.send_raw(r#"{"type":"WRONGROOM"}"#));
    assert_eq!(caller_task.await.unwrap(), RouterExit::Redirected);
    assert_eq!(caller_ui.locations(), vec!["/".to_owned()]);
    assert_eq!(caller_pc.signaling_state(), MockSignalingState::Closed);
    assert_ne!(callee_pc.signaling_state(), MockSignalingState::Closed);

    callee_cmd.send(RouterCommand::Hangup).await.unwrap();
    drop(callee_link.server);
    drop(caller_link.server);
    callee_task.abort();
}
