use crate::error::{NegotiationError, PlatformError};
use crate::platform::{OfferOptions, PeerConnection};
use loopcall_core::{IceCandidate, PeerId, SessionDescription};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Early candidates held per endpoint; anything beyond is dropped.
pub const MAX_PENDING_CANDIDATES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateDisposition {
    Applied,
    /// Held until the remote description is set.
    Queued,
    /// The queue was full.
    Dropped,
}

/// A named peer connection plus the candidates that arrived too early for it.
///
/// Every negotiation step is bounded by the endpoint's timeout. Candidates
/// received before a remote description exist are queued and flushed, in
/// arrival order, right after `set_remote_description` succeeds.
pub struct PeerEndpoint {
    name: String,
    connection: Arc<dyn PeerConnection>,
    pending: Mutex<Vec<IceCandidate>>,
    timeout: Duration,
}

impl PeerEndpoint {
    pub fn new(
        name: impl Into<String>,
        connection: Arc<dyn PeerConnection>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            connection,
            pending: Mutex::new(Vec::new()),
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> PeerId {
        self.connection.id()
    }

    pub fn connection(&self) -> &Arc<dyn PeerConnection> {
        &self.connection
    }

    pub async fn pending_candidates(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn step<T>(
        &self,
        step: &'static str,
        fut: impl Future<Output = Result<T, PlatformError>>,
    ) -> Result<T, NegotiationError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(NegotiationError::Step { step, source }),
            Err(_) => Err(NegotiationError::Timeout {
                step,
                timeout: self.timeout,
            }),
        }
    }

    pub async fn create_offer(
        &self,
        options: &OfferOptions,
    ) -> Result<SessionDescription, NegotiationError> {
        debug!("{} createOffer start", self.name);
        self.step("createOffer", self.connection.create_offer(options))
            .await
    }

    pub async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        debug!("{} createAnswer start", self.name);
        self.step("createAnswer", self.connection.create_answer())
            .await
    }

    pub async fn set_local_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), NegotiationError> {
        debug!("{} setLocalDescription start", self.name);
        self.step(
            "setLocalDescription",
            self.connection.set_local_description(desc),
        )
        .await?;
        info!("{} setLocalDescription complete", self.name);
        Ok(())
    }

    /// Applies the remote description, then flushes queued candidates.
    /// Returns how many queued candidates were flushed.
    pub async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<usize, NegotiationError> {
        // Held for the whole step so a candidate cannot slip into the queue after the flush.
        let mut pending = self.pending.lock().await;

        debug!("{} setRemoteDescription start", self.name);
        self.step(
            "setRemoteDescription",
            self.connection.set_remote_description(desc),
        )
        .await?;
        info!("{} setRemoteDescription complete", self.name);

        let queued = std::mem::take(&mut *pending);
        let flushed = queued.len();
        for candidate in queued {
            if let Err(e) = self
                .step("addIceCandidate", self.connection.add_ice_candidate(candidate))
                .await
            {
                warn!("{} failed to add queued ICE candidate: {}", self.name, e);
            }
        }
        if flushed > 0 {
            debug!("{} flushed {} queued ICE candidates", self.name, flushed);
        }

        Ok(flushed)
    }

    pub async fn add_ice_candidate(
        &self,
        candidate: IceCandidate,
    ) -> Result<CandidateDisposition, NegotiationError> {
        let mut pending = self.pending.lock().await;

        if !self.connection.has_remote_description().await {
            if pending.len() >= MAX_PENDING_CANDIDATES {
                warn!(
                    "{} already holds {} early ICE candidates, dropping one",
                    self.name,
                    pending.len()
                );
                return Ok(CandidateDisposition::Dropped);
            }
            debug!(
                "{} has no remote description yet, queueing ICE candidate",
                self.name
            );
            pending.push(candidate);
            return Ok(CandidateDisposition::Queued);
        }

        self.step("addIceCandidate", self.connection.add_ice_candidate(candidate))
            .await?;
        Ok(CandidateDisposition::Applied)
    }

    /// Closes the connection and drops anything still queued.
    pub async fn close(&self) -> Result<(), PlatformError> {
        self.pending.lock().await.clear();
        self.connection.close().await
    }
}
