use crate::platform::TrackKind;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Opus frame carrying 20ms of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

/// VP8 keyframe header followed by an empty partition. Enough to get RTP flowing.
const VP8_PLACEHOLDER: [u8; 10] = [0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a, 0x02, 0x00, 0x02, 0x00];

const AUDIO_FRAME: Duration = Duration::from_millis(20);
const VIDEO_FRAME: Duration = Duration::from_millis(33);

/// Feeds placeholder frames into a captured track until the track is dropped.
pub(crate) fn spawn_sample_pump(track: &Arc<TrackLocalStaticSample>, kind: TrackKind) {
    let weak = Arc::downgrade(track);
    let (payload, frame) = match kind {
        TrackKind::Audio => (Bytes::from_static(&OPUS_SILENCE), AUDIO_FRAME),
        TrackKind::Video => (Bytes::from_static(&VP8_PLACEHOLDER), VIDEO_FRAME),
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(frame);
        loop {
            ticker.tick().await;
            let Some(track) = weak.upgrade() else {
                break;
            };
            let sample = Sample {
                data: payload.clone(),
                duration: frame,
                ..Default::default()
            };
            if let Err(e) = track.write_sample(&sample).await {
                trace!("Dropped {} sample: {}", kind, e);
            }
        }
        debug!("Sample pump for {} track stopped", kind);
    });
}
