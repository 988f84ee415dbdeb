use crate::error::PlatformError;
use crate::platform::{
    IceConnectionState, MediaStream, OfferOptions, PeerConnection, PeerEvent, RemoteTrack,
    RtcConfig, TrackKind,
};
use async_trait::async_trait;
use loopcall_core::{IceCandidate, IceServerConfig, PeerId, SdpType, SessionDescription};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

pub struct NativePeerConnection {
    id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
    /// Виды медиа, для которых уже есть трансивер (отправка или приём).
    negotiated_kinds: Mutex<HashSet<TrackKind>>,
}

impl NativePeerConnection {
    /// Инициализация нового WebRTC соединения.
    /// events: канал, в который соединение "выплевывает" события для цикла владельца.
    pub async fn new(
        config: &RtcConfig,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Self, PlatformError> {
        let id = PeerId::new();

        // 1. Регистрация кодеков: Opus для звука, VP8 и прочие для видео
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        // 2. Интерцепторы (RTCP отчеты, NACK)
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 3. STUN/TURN сервера
        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // --- Callbacks ---
        // Каждое замыкание должно быть 'static, поэтому клонируем events для каждого.

        // A. Состояние соединения
        let state_tx = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    debug!("Peer connection {} state: {}", id, s);
                    match s {
                        RTCPeerConnectionState::Failed
                        | RTCPeerConnectionState::Disconnected
                        | RTCPeerConnectionState::Closed => {
                            let _ = tx.send(PeerEvent::Disconnected(id)).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        // B. Состояние ICE
        let ice_state_tx = events.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = ice_state_tx.clone();

                Box::pin(async move {
                    let Some(state) = map_ice_state(s) else {
                        return;
                    };
                    let _ = tx
                        .send(PeerEvent::IceConnectionStateChanged(id, state))
                        .await;
                })
            },
        ));

        // C. Trickle ICE: локальные кандидаты уходят владельцу
        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else {
                    let _ = tx.send(PeerEvent::IceGatheringComplete(id)).await;
                    return;
                };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                let _ = tx.send(PeerEvent::IceCandidate(id, candidate)).await;
            })
        }));

        // D. Входящие треки
        let track_tx = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        RTPCodecType::Video => TrackKind::Video,
                        _ => return,
                    };
                    let remote = RemoteTrack {
                        stream_id: track.stream_id(),
                        track_id: track.id(),
                        kind,
                    };
                    let _ = tx.send(PeerEvent::Track(id, remote)).await;
                })
            },
        ));

        info!("Created peer connection {}", id);

        Ok(Self {
            id,
            peer_connection,
            negotiated_kinds: Mutex::new(HashSet::new()),
        })
    }
}

#[async_trait]
impl PeerConnection for NativePeerConnection {
    fn id(&self) -> PeerId {
        self.id
    }

    async fn add_stream(&self, stream: &MediaStream) -> Result<(), PlatformError> {
        let mut kinds = self.negotiated_kinds.lock().await;

        for track in stream.tracks() {
            let Some(source) = &track.local else {
                debug!("Track {} has no local source, not sending it", track.id);
                continue;
            };

            let sender = self
                .peer_connection
                .add_track(Arc::clone(source) as Arc<dyn TrackLocal + Send + Sync>)
                .await?;
            kinds.insert(track.kind);

            // RTCP нужно вычитывать, иначе интерцепторы не работают
            tokio::spawn(async move {
                let mut rtcp_buf = vec![0u8; 1500];
                while let Ok((_, _)) = sender.read(&mut rtcp_buf).await {}
            });
        }

        Ok(())
    }

    async fn create_offer(
        &self,
        options: &OfferOptions,
    ) -> Result<SessionDescription, PlatformError> {
        let mut kinds = self.negotiated_kinds.lock().await;

        let wanted = [
            (options.offer_to_receive_audio, TrackKind::Audio),
            (options.offer_to_receive_video, TrackKind::Video),
        ];
        for (receive, kind) in wanted {
            if receive && kinds.insert(kind) {
                self.peer_connection
                    .add_transceiver_from_kind(
                        codec_type(kind),
                        Some(RTCRtpTransceiverInit {
                            direction: RTCRtpTransceiverDirection::Recvonly,
                            send_encodings: vec![],
                        }),
                    )
                    .await?;
            }
        }

        let offer = self
            .peer_connection
            .create_offer(Some(RTCOfferOptions {
                ice_restart: options.ice_restart,
                ..Default::default()
            }))
            .await?;
        from_rtc_description(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, PlatformError> {
        let answer = self.peer_connection.create_answer(None).await?;
        from_rtc_description(answer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), PlatformError> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), PlatformError> {
        let desc = to_rtc_description(desc)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn has_remote_description(&self) -> bool {
        self.peer_connection.remote_description().await.is_some()
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), PlatformError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PlatformError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
        ..Default::default()
    }
}

fn codec_type(kind: TrackKind) -> RTPCodecType {
    match kind {
        TrackKind::Audio => RTPCodecType::Audio,
        TrackKind::Video => RTPCodecType::Video,
    }
}

fn map_ice_state(state: RTCIceConnectionState) -> Option<IceConnectionState> {
    let state = match state {
        RTCIceConnectionState::New => IceConnectionState::New,
        RTCIceConnectionState::Checking => IceConnectionState::Checking,
        RTCIceConnectionState::Connected => IceConnectionState::Connected,
        RTCIceConnectionState::Completed => IceConnectionState::Completed,
        RTCIceConnectionState::Disconnected => IceConnectionState::Disconnected,
        RTCIceConnectionState::Failed => IceConnectionState::Failed,
        RTCIceConnectionState::Closed => IceConnectionState::Closed,
        _ => return None,
    };
    Some(state)
}

/// Парсинг SDP происходит здесь: некорректный текст отклоняется до вызова движка.
fn to_rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription, PlatformError> {
    let parsed = match desc.kind {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp),
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp),
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp),
        SdpType::Rollback => {
            return Err(PlatformError::InvalidDescription(
                "rollback is not supported".to_owned(),
            ));
        }
    };
    parsed.map_err(|e| PlatformError::InvalidDescription(e.to_string()))
}

fn from_rtc_description(desc: RTCSessionDescription) -> Result<SessionDescription, PlatformError> {
    let kind = match desc.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        other => {
            return Err(PlatformError::InvalidDescription(format!(
                "unexpected sdp type {other}"
            )));
        }
    };
    Ok(SessionDescription {
        kind,
        sdp: desc.sdp,
    })
}
