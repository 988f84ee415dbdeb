use crate::model::description::{IceCandidate, SdpType, SessionDescription};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed signaling message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0} cannot be sent as a signaling message")]
    NotSendable(&'static str),
}

/// Message exchanged over the signaling channel, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SignalingMessage {
    #[serde(rename = "CHATMSG")]
    Chat { value: String },

    #[serde(rename = "offer")]
    Offer { sdp: String },

    #[serde(rename = "answer")]
    Answer { sdp: String },

    #[serde(rename = "candidate")]
    Candidate {
        label: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        candidate: String,
    },

    #[serde(rename = "GETROOM")]
    GetRoom { value: String },

    #[serde(rename = "WRONGROOM")]
    WrongRoom,

    /// Any `type` this side does not understand.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl SignalingMessage {
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        if matches!(self, Self::Unknown) {
            return Err(MessageError::NotSendable(self.kind()));
        }
        Ok(serde_json::to_string(self)?)
    }

    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "CHATMSG",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
            Self::GetRoom { .. } => "GETROOM",
            Self::WrongRoom => "WRONGROOM",
            Self::Unknown => "unknown",
        }
    }

    /// Wraps a locally generated description. Only offers and answers travel.
    pub fn from_description(desc: SessionDescription) -> Result<Self, MessageError> {
        match desc.kind {
            SdpType::Offer => Ok(Self::Offer { sdp: desc.sdp }),
            SdpType::Answer => Ok(Self::Answer { sdp: desc.sdp }),
            SdpType::Pranswer => Err(MessageError::NotSendable("pranswer")),
            SdpType::Rollback => Err(MessageError::NotSendable("rollback")),
        }
    }

    /// Candidates without an m-line index cannot be described on the wire.
    pub fn from_candidate(candidate: &IceCandidate) -> Option<Self> {
        let label = candidate.sdp_m_line_index?;
        Some(Self::Candidate {
            label,
            id: candidate.sdp_mid.clone(),
            candidate: candidate.candidate.clone(),
        })
    }
}
