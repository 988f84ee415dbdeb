use crate::error::RouterError;
use crate::platform::{MediaStream, MediaTrack, MediaView, PeerEvent, Platform};
use crate::session::{CandidateDisposition, PeerEndpoint, SessionConfig, SessionContext};
use crate::signaling::{RouterCommand, SignalingOutput};
use crate::ui::UiSink;
use loopcall_core::{IceCandidate, RoomId, SessionDescription, SignalingMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// What a single inbound message turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    ChatAppended,
    /// Remote offer applied and a local answer sent back.
    Answered,
    RemoteAnswerApplied,
    Candidate(CandidateDisposition),
    RoomAssigned(RoomId),
    Redirected,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterExit {
    /// `WRONGROOM` received; the page was navigated away.
    Redirected,
    ChannelClosed,
    Shutdown,
}

/// Turns inbound signaling messages into peer connection mutations and UI updates.
///
/// Owns the session of the legacy call path. The room assignment and channel
/// readiness belong to the signaling channel and survive hangups.
pub struct SignalingRouter {
    platform: Arc<dyn Platform>,
    output: Arc<dyn SignalingOutput>,
    ui: Arc<dyn UiSink>,
    config: SessionConfig,
    session: Option<SessionContext>,
    room: Option<RoomId>,
    channel_ready: bool,
    event_tx: mpsc::Sender<PeerEvent>,
    event_rx: mpsc::Receiver<PeerEvent>,
}

impl SignalingRouter {
    pub fn new(
        platform: Arc<dyn Platform>,
        output: Arc<dyn SignalingOutput>,
        ui: Arc<dyn UiSink>,
        config: SessionConfig,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);

        Self {
            platform,
            output,
            ui,
            config,
            session: None,
            room: None,
            channel_ready: false,
            event_tx,
            event_rx,
        }
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    pub fn is_channel_ready(&self) -> bool {
        self.channel_ready
    }

    pub fn set_channel_ready(&mut self, ready: bool) {
        self.channel_ready = ready;
    }

    fn endpoint(&self) -> Result<Arc<PeerEndpoint>, RouterError> {
        self.session
            .as_ref()
            .map(|s| Arc::clone(s.endpoint()))
            .ok_or(RouterError::NoSession)
    }

    /// Acquires media, creates the peer connection and, as initiator, sends the offer.
    pub async fn start_session(&mut self, initiator: bool) -> Result<(), RouterError> {
        if self.session.is_some() {
            warn!("Session already active, replacing it");
            self.hangup().await;
        }

        let stream = match self.platform.get_user_media(&self.config.media).await {
            Ok(stream) => stream,
            Err(e) => {
                self.ui.alert(&format!("getUserMedia() error: {}", e.name()));
                return Err(e.into());
            }
        };
        self.platform.attach_stream(MediaView::Local, &stream);

        let connection = self
            .platform
            .create_peer_connection(&self.config.rtc, self.event_tx.clone())
            .await?;
        let endpoint = Arc::new(PeerEndpoint::new(
            "pc",
            connection,
            self.config.negotiation_timeout,
        ));

        if let Err(e) = endpoint.connection().add_stream(&stream).await {
            let _ = endpoint.close().await;
            return Err(e.into());
        }

        info!("Session started (initiator: {})", initiator);
        self.session = Some(SessionContext::new(endpoint, initiator, stream));

        if initiator {
            self.do_call().await?;
        }
        Ok(())
    }

    async fn do_call(&mut self) -> Result<(), RouterError> {
        let endpoint = self.endpoint()?;
        let offer = endpoint.create_offer(&self.config.offer_options).await?;
        self.set_local_and_send(&endpoint, offer).await
    }

    async fn set_local_and_send(
        &self,
        endpoint: &PeerEndpoint,
        desc: SessionDescription,
    ) -> Result<(), RouterError> {
        let msg = SignalingMessage::from_description(desc.clone())?;
        endpoint.set_local_description(desc).await?;
        self.output.send(msg).await;
        Ok(())
    }

    /// Handles one message and logs whatever goes wrong. Failures never
    /// escape; the message is simply dropped.
    pub async fn process_signaling_message(&mut self, text: &str) -> Option<Dispatch> {
        match self.try_process(text).await {
            Ok(dispatch) => Some(dispatch),
            Err(RouterError::Message(e)) => {
                warn!("Dropping signaling message: {}", e);
                None
            }
            Err(e) => {
                error!("Failed to handle signaling message: {}", e);
                None
            }
        }
    }

    pub async fn try_process(&mut self, text: &str) -> Result<Dispatch, RouterError> {
        let msg = SignalingMessage::parse(text)?;
        if msg == SignalingMessage::Unknown {
            warn!("Ignoring signaling message of unrecognized type: {}", text);
            return Ok(Dispatch::Ignored);
        }
        debug!("Received {} message", msg.kind());
        self.dispatch(msg).await
    }

    async fn dispatch(&mut self, msg: SignalingMessage) -> Result<Dispatch, RouterError> {
        match msg {
            SignalingMessage::Chat { value } => {
                self.ui.append_chat(&value);
                Ok(Dispatch::ChatAppended)
            }

            SignalingMessage::Offer { sdp } => {
                let endpoint = self.endpoint()?;
                endpoint
                    .set_remote_description(SessionDescription::offer(sdp))
                    .await?;
                let answer = endpoint.create_answer().await?;
                self.set_local_and_send(&endpoint, answer).await?;
                Ok(Dispatch::Answered)
            }

            SignalingMessage::Answer { sdp } => {
                let endpoint = self.endpoint()?;
                endpoint
                    .set_remote_description(SessionDescription::answer(sdp))
                    .await?;
                Ok(Dispatch::RemoteAnswerApplied)
            }

            SignalingMessage::Candidate {
                label, candidate, ..
            } => {
                let endpoint = self.endpoint()?;
                let disposition = endpoint
                    .add_ice_candidate(IceCandidate::from_wire(label, candidate))
                    .await?;
                Ok(Dispatch::Candidate(disposition))
            }

            SignalingMessage::GetRoom { value } => {
                let room = RoomId::from(value);
                info!("Assigned room {}", room);
                self.ui.room_received(&room);
                self.room = Some(room.clone());
                Ok(Dispatch::RoomAssigned(room))
            }

            SignalingMessage::WrongRoom => {
                warn!("Room rejected by the server, leaving");
                self.hangup().await;
                self.ui.navigate("/");
                Ok(Dispatch::Redirected)
            }

            SignalingMessage::Unknown => Ok(Dispatch::Ignored),
        }
    }

    pub async fn handle_peer_event(&mut self, event: PeerEvent) {
        let Some(session) = self.session.as_mut() else {
            debug!("No session, dropping {:?}", event);
            return;
        };
        if event.peer_id() != session.endpoint().id() {
            debug!("Event from a closed peer connection, dropping it");
            return;
        }

        match event {
            PeerEvent::IceCandidate(_, candidate) => {
                match SignalingMessage::from_candidate(&candidate) {
                    Some(msg) => self.output.send(msg).await,
                    None => debug!("Local candidate has no m-line index, not sending it"),
                }
            }
            PeerEvent::IceGatheringComplete(_) => debug!("ICE gathering complete"),
            PeerEvent::IceConnectionStateChanged(_, state) => info!("ICE state: {}", state),
            PeerEvent::Track(_, track) => {
                if session.replace_remote_stream(&track.stream_id) {
                    let stream = MediaStream::new(track.stream_id.clone()).with_track(
                        MediaTrack::detached(track.track_id, track.kind, "remote"),
                    );
                    self.platform.attach_stream(MediaView::Remote, &stream);
                    info!("Received remote stream {}", track.stream_id);
                }
            }
            PeerEvent::Disconnected(_) => warn!("Peer connection lost"),
        }
    }

    /// Sends chat text. Dropped when the signaling channel is not ready.
    pub async fn chat_send_message(&self, text: &str) -> bool {
        if !self.channel_ready {
            debug!("Signaling channel not ready, chat message dropped");
            return false;
        }
        self.output
            .send(SignalingMessage::Chat {
                value: text.to_owned(),
            })
            .await;
        true
    }

    pub async fn hangup(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        info!("Ending call");
        if let Err(e) = session.endpoint().close().await {
            warn!("Failed to close peer connection: {}", e);
        }
    }

    pub async fn handle_command(&mut self, cmd: RouterCommand) {
        match cmd {
            RouterCommand::StartSession { initiator } => {
                if let Err(e) = self.start_session(initiator).await {
                    error!("Failed to start session: {}", e);
                }
            }
            RouterCommand::Chat(text) => {
                self.chat_send_message(&text).await;
            }
            RouterCommand::Hangup | RouterCommand::Shutdown => self.hangup().await,
        }
    }

    /// Event loop: inbound messages, UI commands and engine events are handled
    /// one at a time, in arrival order.
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<String>,
        mut commands: mpsc::Receiver<RouterCommand>,
    ) -> RouterExit {
        self.channel_ready = true;
        info!("Signaling router started");

        let exit = loop {
            tokio::select! {
                msg = inbound.recv() => {
                    match msg {
                        Some(text) => {
                            if let Some(Dispatch::Redirected) = self.process_signaling_message(&text).await {
                                break RouterExit::Redirected;
                            }
                        }
                        None => {
                            info!("Signaling channel closed");
                            break RouterExit::ChannelClosed;
                        }
                    }
                }

                Some(cmd) = commands.recv() => {
                    if let RouterCommand::Shutdown = cmd {
                        info!("Shutdown requested");
                        break RouterExit::Shutdown;
                    }
                    self.handle_command(cmd).await;
                }

                Some(event) = self.event_rx.recv() => self.handle_peer_event(event).await,
            }
        };

        self.channel_ready = false;
        self.hangup().await;
        info!("Signaling router finished");
        exit
    }
}
