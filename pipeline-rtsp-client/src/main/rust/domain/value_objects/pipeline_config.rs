use super::PlatformClass;
use crate::domain::errors::{DomainError, Result};

pub const DEFAULT_SOURCE_ADDRESS: &str = "rtsp://127.0.0.1:8554/stream";
pub const DEFAULT_CODEC_HINT: &str = "h264";
pub const DEFAULT_RETRY_COUNT: u16 = 10;
pub const DEFAULT_LATENCY_MS: u32 = 200;

/// Immutable input describing the stream to pull and how to present it
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    source_address: String,
    codec_hint: String,
    display_enabled: bool,
    platform: PlatformClass,
    retry_count: u16,
    latency_ms: u32,
}

impl PipelineConfig {
    pub fn new(
        source_address: String,
        codec_hint: String,
        display_enabled: bool,
        platform: PlatformClass,
    ) -> Result<Self> {
        Self::validate_source_address(&source_address)?;

        Ok(Self {
            source_address,
            codec_hint,
            display_enabled,
            platform,
            retry_count: DEFAULT_RETRY_COUNT,
            latency_ms: DEFAULT_LATENCY_MS,
        })
    }

    pub fn with_retry_count(mut self, retry_count: u16) -> Result<Self> {
        if retry_count == 0 {
            return Err(DomainError::InvalidRetryCount);
        }
        self.retry_count = retry_count;
        Ok(self)
    }

    pub fn with_latency_ms(mut self, latency_ms: u32) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn source_address(&self) -> &str {
        &self.source_address
    }

    pub fn codec_hint(&self) -> &str {
        &self.codec_hint
    }

    pub fn display_enabled(&self) -> bool {
        self.display_enabled
    }

    pub fn platform(&self) -> PlatformClass {
        self.platform
    }

    pub fn retry_count(&self) -> u16 {
        self.retry_count
    }

    pub fn latency_ms(&self) -> u32 {
        self.latency_ms
    }

    fn validate_source_address(address: &str) -> Result<()> {
        if !address.starts_with("rtsp://") {
            return Err(DomainError::InvalidRtspUrl(address.to_string()));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_address: DEFAULT_SOURCE_ADDRESS.to_string(),
            codec_hint: DEFAULT_CODEC_HINT.to_string(),
            display_enabled: true,
            platform: PlatformClass::detect(),
            retry_count: DEFAULT_RETRY_COUNT,
            latency_ms: DEFAULT_LATENCY_MS,
        }
    }
}
