use async_trait::async_trait;
use loopcall_client::{
    MediaConstraints, MediaStream, MediaTrack, MediaView, OfferOptions, PeerConnection, PeerEvent,
    Platform, PlatformDetails, PlatformError, RtcConfig, TrackKind,
};
use loopcall_core::{IceCandidate, PeerId, SdpType, SessionDescription};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    Closed,
}

struct MockPcState {
    signaling: MockSignalingState,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    candidates: Vec<IceCandidate>,
    streams: Vec<String>,
}

/// Peer connection that follows the offer/answer state machine without any
/// networking. Produces SDP text starting with `v=0`.
pub struct MockPeerConnection {
    id: PeerId,
    state: Mutex<MockPcState>,
    events: mpsc::Sender<PeerEvent>,
    remote_delay: Option<Duration>,
}

impl MockPeerConnection {
    fn new(events: mpsc::Sender<PeerEvent>, remote_delay: Option<Duration>) -> Self {
        Self {
            id: PeerId::new(),
            state: Mutex::new(MockPcState {
                signaling: MockSignalingState::Stable,
                local: None,
                remote: None,
                candidates: Vec::new(),
                streams: Vec::new(),
            }),
            events,
            remote_delay,
        }
    }

    pub fn signaling_state(&self) -> MockSignalingState {
        self.state.lock().unwrap().signaling
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.state.lock().unwrap().remote.clone()
    }

    pub fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().unwrap().local.clone()
    }

    /// Candidate lines applied so far, in order.
    pub fn applied_candidates(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .candidates
            .iter()
            .map(|c| c.candidate.clone())
            .collect()
    }

    pub fn added_streams(&self) -> Vec<String> {
        self.state.lock().unwrap().streams.clone()
    }

    /// Simulates the engine emitting an event for this connection.
    pub async fn emit(&self, event: impl FnOnce(PeerId) -> PeerEvent) {
        let _ = self.events.send(event(self.id)).await;
    }

    fn sdp(&self, kind: &str) -> String {
        format!("v=0\r\no=mock {} 2 IN IP4 127.0.0.1\r\ns={}\r\n", self.id, kind)
    }

    fn ensure_open(state: &MockPcState) -> Result<(), PlatformError> {
        if state.signaling == MockSignalingState::Closed {
            return Err(PlatformError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl PeerConnection for MockPeerConnection {
    fn id(&self) -> PeerId {
        self.id
    }

    async fn add_stream(&self, stream: &MediaStream) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        state.streams.push(stream.id().to_owned());
        Ok(())
    }

    async fn create_offer(
        &self,
        _options: &OfferOptions,
    ) -> Result<SessionDescription, PlatformError> {
        let state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        Ok(SessionDescription::offer(self.sdp("offer")))
    }

    async fn create_answer(&self) -> Result<SessionDescription, PlatformError> {
        let state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        if state.signaling != MockSignalingState::HaveRemoteOffer {
            return Err(PlatformError::InvalidState(format!(
                "cannot answer in {:?}",
                state.signaling
            )));
        }
        Ok(SessionDescription::answer(self.sdp("answer")))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        state.signaling = match (desc.kind, state.signaling) {
            (SdpType::Offer, MockSignalingState::Stable) => MockSignalingState::HaveLocalOffer,
            (SdpType::Answer, MockSignalingState::HaveRemoteOffer) => MockSignalingState::Stable,
            (kind, current) => {
                return Err(PlatformError::InvalidState(format!(
                    "local {kind:?} in {current:?}"
                )));
            }
        };
        state.local = Some(desc);
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), PlatformError> {
        if let Some(delay) = self.remote_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        if !desc.sdp.starts_with("v=0") {
            return Err(PlatformError::InvalidDescription(
                "sdp must start with v=0".to_owned(),
            ));
        }
        state.signaling = match (desc.kind, state.signaling) {
            (SdpType::Offer, MockSignalingState::Stable) => MockSignalingState::HaveRemoteOffer,
            (SdpType::Answer, MockSignalingState::HaveLocalOffer) => MockSignalingState::Stable,
            (kind, current) => {
                return Err(PlatformError::InvalidState(format!(
                    "remote {kind:?} in {current:?}"
                )));
            }
        };
        state.remote = Some(desc);
        Ok(())
    }

    async fn has_remote_description(&self) -> bool {
        self.state.lock().unwrap().remote.is_some()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        if state.remote.is_none() {
            return Err(PlatformError::InvalidState(
                "no remote description".to_owned(),
            ));
        }
        state.candidates.push(candidate);
        Ok(())
    }

    async fn close(&self) -> Result<(), PlatformError> {
        self.state.lock().unwrap().signaling = MockSignalingState::Closed;
        Ok(())
    }
}

/// Platform handing out `MockPeerConnection`s and detached media.
#[derive(Default)]
pub struct MockPlatform {
    connections: Mutex<Vec<Arc<MockPeerConnection>>>,
    attached: Mutex<Vec<(MediaView, String)>>,
    deny_media: bool,
    remote_delay: Option<Duration>,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `getUserMedia` always fails with `NotAllowedError`.
    pub fn denying_media() -> Arc<Self> {
        Arc::new(Self {
            deny_media: true,
            ..Default::default()
        })
    }

    /// Every `set_remote_description` takes `delay`.
    pub fn with_remote_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            remote_delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn connections(&self) -> Vec<Arc<MockPeerConnection>> {
        self.connections.lock().unwrap().clone()
    }

    pub fn connection(&self, index: usize) -> Arc<MockPeerConnection> {
        self.connections.lock().unwrap()[index].clone()
    }

    pub fn attached(&self, view: MediaView) -> Vec<String> {
        self.attached
            .lock()
            .unwrap()
            .iter()
            .filter(|(v, _)| *v == view)
            .map(|(_, id)| id.clone())
            .collect()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn details(&self) -> PlatformDetails {
        PlatformDetails {
            name: "mock".to_owned(),
            version: "0".to_owned(),
        }
    }

    async fn create_peer_connection(
        &self,
        _config: &RtcConfig,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>, PlatformError> {
        let pc = Arc::new(MockPeerConnection::new(events, self.remote_delay));
        self.connections.lock().unwrap().push(pc.clone());
        Ok(pc)
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, PlatformError> {
        if self.deny_media {
            return Err(PlatformError::MediaUnavailable {
                name: "NotAllowedError",
                reason: "permission denied".to_owned(),
            });
        }

        let mut stream = MediaStream::new(format!("local-{}", PeerId::new()));
        if constraints.audio {
            stream = stream.with_track(MediaTrack::detached("mic", TrackKind::Audio, "Mock mic"));
        }
        if constraints.video {
            stream = stream.with_track(MediaTrack::detached("cam", TrackKind::Video, "Mock cam"));
        }
        Ok(stream)
    }

    fn attach_stream(&self, view: MediaView, stream: &MediaStream) {
        self.attached
            .lock()
            .unwrap()
            .push((view, stream.id().to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_rejects_candidate_before_remote_description() {
        let (tx, _rx) = mpsc::channel(8);
        let pc = MockPeerConnection::new(tx, None);

        let err = pc
            .add_ice_candidate(IceCandidate::from_wire(0, "candidate:1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_mock_offer_answer_states() {
        let (tx, _rx) = mpsc::channel(8);
        let caller = MockPeerConnection::new(tx.clone(), None);
        let callee = MockPeerConnection::new(tx, None);

        let offer = caller.create_offer(&OfferOptions::default()).await.unwrap();
        caller.set_local_description(offer.clone()).await.unwrap();
        callee.set_remote_description(offer).await.unwrap();
        assert_eq!(callee.signaling_state(), MockSignalingState::HaveRemoteOffer);

        let answer = callee.create_answer().await.unwrap();
        callee.set_local_description(answer.clone()).await.unwrap();
        caller.set_remote_description(answer).await.unwrap();

        assert_eq!(caller.signaling_state(), MockSignalingState::Stable);
        assert_eq!(callee.signaling_state(), MockSignalingState::Stable);
    }
}
