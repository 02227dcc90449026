use crate::domain::errors::{DomainError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    H264,
    H265,
}

impl VideoCodec {
    /// Resolve a short codec hint such as "h264" into a supported codec
    pub fn from_hint(hint: &str) -> Result<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "h264" => Ok(Self::H264),
            "h265" => Ok(Self::H265),
            _ => Err(DomainError::UnsupportedCodec(hint.to_string())),
        }
    }

    pub fn as_hint(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::H265 => "h265",
        }
    }

    /// RTP depayloader element for this codec ("rtph264depay")
    pub fn depayer_kind(&self) -> String {
        format!("rtp{}depay", self.as_hint())
    }

    /// Bitstream parser element for this codec ("h264parse")
    pub fn parser_kind(&self) -> String {
        format!("{}parse", self.as_hint())
    }
}
