use std::fmt;

/// Description of a newly exposed output, as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescription {
    /// Name of the output port on the emitting node
    pub port: String,
    /// Media type name of the first caps structure, e.g. "application/x-rtp"
    pub media_type: String,
    /// The `media` field carried by RTP caps ("video", "audio"), when present
    pub media: Option<String>,
}

impl OutputDescription {
    pub fn new(port: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            media_type: media_type.into(),
            media: None,
        }
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// Media type a deferred edge is willing to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// RTP packets carrying video (RTP outputs without a `media` field are accepted)
    RtpVideo,
    /// Decoded video frames in any raw format or memory
    RawVideo,
}

impl MediaType {
    pub fn accepts(&self, output: &OutputDescription) -> bool {
        match self {
            Self::RtpVideo => {
                output.media_type == "application/x-rtp"
                    && output.media.as_deref().map_or(true, |m| m == "video")
            }
            Self::RawVideo => output.media_type.starts_with("video/x-raw"),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RtpVideo => write!(f, "application/x-rtp (video)"),
            Self::RawVideo => write!(f, "video/x-raw"),
        }
    }
}
