use crate::error::CallError;
use crate::platform::{MediaStream, MediaTrack, MediaView, PeerEvent, Platform};
use crate::session::{PeerEndpoint, SessionConfig};
use crate::ui::{CallControls, UiSink};
use futures::future::join_all;
use loopcall_core::{PeerId, SessionDescription};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Descriptions produced while negotiating one loopback call.
#[derive(Debug, Clone, Default)]
pub struct CallOutcome {
    pub offer: Option<SessionDescription>,
    pub answer: Option<SessionDescription>,
}

#[derive(Default)]
struct CallTimings {
    started_at: Option<Instant>,
    setup_time: Option<Duration>,
    remote_stream_id: Option<String>,
}

struct LoopbackPeers {
    pc1: Arc<PeerEndpoint>,
    pc2: Arc<PeerEndpoint>,
    forwarder: JoinHandle<()>,
}

/// Two peer connections in one process, wired straight to each other.
///
/// Mirrors the Start / Call / Hang up buttons: each operation is only
/// allowed while its control is enabled.
pub struct LoopbackCall {
    platform: Arc<dyn Platform>,
    ui: Arc<dyn UiSink>,
    config: SessionConfig,
    controls: CallControls,
    local_stream: Option<MediaStream>,
    peers: Option<LoopbackPeers>,
    timings: Arc<Mutex<CallTimings>>,
}

impl LoopbackCall {
    pub fn new(platform: Arc<dyn Platform>, ui: Arc<dyn UiSink>, config: SessionConfig) -> Self {
        let controls = CallControls::default();
        ui.set_controls(controls);

        Self {
            platform,
            ui,
            config,
            controls,
            local_stream: None,
            peers: None,
            timings: Arc::new(Mutex::new(CallTimings::default())),
        }
    }

    pub fn controls(&self) -> CallControls {
        self.controls
    }

    pub fn local_stream(&self) -> Option<&MediaStream> {
        self.local_stream.as_ref()
    }

    pub fn pc1(&self) -> Option<&Arc<PeerEndpoint>> {
        self.peers.as_ref().map(|p| &p.pc1)
    }

    pub fn pc2(&self) -> Option<&Arc<PeerEndpoint>> {
        self.peers.as_ref().map(|p| &p.pc2)
    }

    /// Time from pressing Call until remote media first reached pc2.
    pub async fn setup_time(&self) -> Option<Duration> {
        self.timings.lock().await.setup_time
    }

    pub async fn remote_stream_id(&self) -> Option<String> {
        self.timings.lock().await.remote_stream_id.clone()
    }

    fn update_controls(&mut self, f: impl FnOnce(&mut CallControls)) {
        f(&mut self.controls);
        self.ui.set_controls(self.controls);
    }

    pub async fn start(&mut self) -> Result<(), CallError> {
        if !self.controls.start {
            return Err(CallError::ControlDisabled("start"));
        }
        info!("Requesting local stream");
        self.update_controls(|c| c.start = false);

        let stream = match self.platform.get_user_media(&self.config.media).await {
            Ok(stream) => stream,
            Err(e) => {
                self.ui.alert(&format!("getUserMedia() error: {}", e.name()));
                return Err(e.into());
            }
        };
        info!("Received local stream");
        self.platform.attach_stream(MediaView::Local, &stream);
        self.local_stream = Some(stream);
        self.update_controls(|c| c.call = true);
        Ok(())
    }

    pub async fn call(&mut self) -> Result<CallOutcome, CallError> {
        if !self.controls.call {
            return Err(CallError::ControlDisabled("call"));
        }
        let stream = self.local_stream.clone().ok_or(CallError::NotStarted)?;

        self.update_controls(|c| {
            c.call = false;
            c.hangup = true;
        });
        info!("Starting call");
        {
            let mut timings = self.timings.lock().await;
            *timings = CallTimings {
                started_at: Some(Instant::now()),
                ..Default::default()
            };
        }

        if let Some(track) = stream.video_tracks().next() {
            info!("Using video device: {}", track.label);
        }
        if let Some(track) = stream.audio_tracks().next() {
            info!("Using audio device: {}", track.label);
        }
        info!("RTCPeerConnection configuration: {:?}", self.config.rtc);

        let (event_tx, event_rx) = mpsc::channel(256);
        let timeout = self.config.negotiation_timeout;

        let pc1 = self
            .platform
            .create_peer_connection(&self.config.rtc, event_tx.clone())
            .await?;
        info!("Created local peer connection object pc1");
        let pc2 = self
            .platform
            .create_peer_connection(&self.config.rtc, event_tx)
            .await?;
        info!("Created remote peer connection object pc2");

        let pc1 = Arc::new(PeerEndpoint::new("pc1", pc1, timeout));
        let pc2 = Arc::new(PeerEndpoint::new("pc2", pc2, timeout));

        let forwarder = tokio::spawn(forward_events(
            event_rx,
            Arc::clone(&pc1),
            Arc::clone(&pc2),
            Arc::clone(&self.platform),
            Arc::clone(&self.timings),
        ));
        self.peers = Some(LoopbackPeers {
            pc1: Arc::clone(&pc1),
            pc2: Arc::clone(&pc2),
            forwarder,
        });

        pc1.connection().add_stream(&stream).await?;
        info!("Added local stream to pc1");

        Ok(negotiate(&pc1, &pc2, &self.config).await)
    }

    pub async fn hangup(&mut self) -> Result<(), CallError> {
        if !self.controls.hangup {
            return Err(CallError::ControlDisabled("hangup"));
        }
        info!("Ending call");

        if let Some(peers) = self.peers.take() {
            let results = join_all([peers.pc1.close(), peers.pc2.close()]).await;
            for e in results.into_iter().filter_map(Result::err) {
                warn!("Failed to close peer connection: {}", e);
            }
            peers.forwarder.abort();
        }

        self.update_controls(|c| {
            c.hangup = false;
            c.call = true;
        });
        Ok(())
    }
}

/// pc1 offers, pc2 answers. A failed step is logged and the rest still runs,
/// except when there is no description left to pass on.
async fn negotiate(pc1: &PeerEndpoint, pc2: &PeerEndpoint, config: &SessionConfig) -> CallOutcome {
    let mut outcome = CallOutcome::default();

    let offer = match pc1.create_offer(&config.offer_options).await {
        Ok(offer) => offer,
        Err(e) => {
            error!("Failed to create session description: {}", e);
            return outcome;
        }
    };
    debug!("Offer from pc1\n{}", offer.sdp);
    outcome.offer = Some(offer.clone());

    if let Err(e) = pc1.set_local_description(offer.clone()).await {
        error!("Failed to set session description: {}", e);
    }
    if let Err(e) = pc2.set_remote_description(offer).await {
        error!("Failed to set session description: {}", e);
    }

    let answer = match pc2.create_answer().await {
        Ok(answer) => answer,
        Err(e) => {
            error!("Failed to create session description: {}", e);
            return outcome;
        }
    };
    debug!("Answer from pc2:\n{}", answer.sdp);
    outcome.answer = Some(answer.clone());

    if let Err(e) = pc2.set_local_description(answer.clone()).await {
        error!("Failed to set session description: {}", e);
    }
    if let Err(e) = pc1.set_remote_description(answer).await {
        error!("Failed to set session description: {}", e);
    }

    outcome
}

/// Hands each side's candidates to the other side and watches pc2 for remote media.
async fn forward_events(
    mut events: mpsc::Receiver<PeerEvent>,
    pc1: Arc<PeerEndpoint>,
    pc2: Arc<PeerEndpoint>,
    platform: Arc<dyn Platform>,
    timings: Arc<Mutex<CallTimings>>,
) {
    while let Some(event) = events.recv().await {
        let Some((from, other)) = route(event.peer_id(), &pc1, &pc2) else {
            continue;
        };

        match event {
            PeerEvent::IceCandidate(_, candidate) => {
                let line = candidate.candidate.clone();
                match other.add_ice_candidate(candidate).await {
                    Ok(_) => info!("{} addIceCandidate success", from.name()),
                    Err(e) => warn!("{} failed to add ICE Candidate: {}", from.name(), e),
                }
                debug!("{} ICE candidate:\n{}", from.name(), line);
            }
            PeerEvent::IceGatheringComplete(_) => {
                debug!("{} ICE candidate:\n(null)", from.name());
            }
            PeerEvent::IceConnectionStateChanged(_, state) => {
                info!("{} ICE state: {}", from.name(), state);
            }
            PeerEvent::Track(_, track) if from.id() == pc2.id() => {
                let mut timings = timings.lock().await;
                if timings.remote_stream_id.as_deref() != Some(track.stream_id.as_str()) {
                    let stream = MediaStream::new(track.stream_id.clone()).with_track(
                        MediaTrack::detached(track.track_id, track.kind, "remote"),
                    );
                    platform.attach_stream(MediaView::Remote, &stream);
                    timings.remote_stream_id = Some(track.stream_id);
                    info!("pc2 received remote stream");
                }
                // First remote media marks the end of call setup.
                if let Some(started_at) = timings.started_at.take() {
                    let elapsed = started_at.elapsed();
                    info!("Setup time: {:.3}ms", elapsed.as_secs_f64() * 1000.0);
                    timings.setup_time = Some(elapsed);
                }
            }
            PeerEvent::Track(_, _) => {}
            PeerEvent::Disconnected(_) => info!("{} disconnected", from.name()),
        }
    }
}

/// Returns (sender, the other side) for an event source.
fn route<'a>(
    id: PeerId,
    pc1: &'a Arc<PeerEndpoint>,
    pc2: &'a Arc<PeerEndpoint>,
) -> Option<(&'a Arc<PeerEndpoint>, &'a Arc<PeerEndpoint>)> {
    if id == pc1.id() {
        Some((pc1, pc2))
    } else if id == pc2.id() {
        Some((pc2, pc1))
    } else {
        None
    }
}

impl Drop for LoopbackCall {
    fn drop(&mut self) {
        if let Some(peers) = &self.peers {
            peers.forwarder.abort();
        }
    }
}
