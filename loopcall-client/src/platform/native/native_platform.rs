use crate::error::PlatformError;
use crate::platform::native::NativePeerConnection;
use crate::platform::native::sample_pump::spawn_sample_pump;
use crate::platform::{
    MediaConstraints, MediaStream, MediaTrack, MediaView, PeerConnection, PeerEvent, Platform,
    PlatformDetails, RtcConfig, TrackKind,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// webrtc-rs backed platform. Capture produces synthetic Opus/VP8 tracks and
/// "rendering" records which stream each view shows.
#[derive(Default)]
pub struct NativePlatform {
    views: DashMap<MediaView, String>,
}

impl NativePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the stream currently attached to `view`.
    pub fn attached_stream(&self, view: MediaView) -> Option<String> {
        self.views.get(&view).map(|id| id.value().clone())
    }
}

#[async_trait]
impl Platform for NativePlatform {
    fn details(&self) -> PlatformDetails {
        PlatformDetails {
            name: "native/webrtc-rs".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }

    async fn create_peer_connection(
        &self,
        config: &RtcConfig,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Arc<dyn PeerConnection>, PlatformError> {
        let pc = NativePeerConnection::new(config, events).await?;
        Ok(Arc::new(pc))
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, PlatformError> {
        if !constraints.audio && !constraints.video {
            return Err(PlatformError::MediaUnavailable {
                name: "TypeError",
                reason: "at least one of audio and video must be requested".to_owned(),
            });
        }

        let id = Uuid::new_v4().to_string();
        let mut stream = MediaStream::new(id.clone());

        if constraints.audio {
            let source = Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48000,
                    channels: 2,
                    ..Default::default()
                },
                "audio".to_owned(),
                id.clone(),
            ));
            spawn_sample_pump(&source, TrackKind::Audio);
            stream = stream.with_track(MediaTrack::with_source(
                TrackKind::Audio,
                "Synthetic microphone",
                source,
            ));
        }

        if constraints.video {
            let source = Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_VP8.to_owned(),
                    clock_rate: 90000,
                    ..Default::default()
                },
                "video".to_owned(),
                id.clone(),
            ));
            spawn_sample_pump(&source, TrackKind::Video);
            stream = stream.with_track(MediaTrack::with_source(
                TrackKind::Video,
                "Synthetic camera",
                source,
            ));
        }

        Ok(stream)
    }

    fn attach_stream(&self, view: MediaView, stream: &MediaStream) {
        info!("Attached stream {} to {}", stream.id(), view);
        self.views.insert(view, stream.id().to_owned());
    }
}
