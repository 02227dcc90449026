use clap::{Parser, ValueEnum};

use crate::domain::value_objects::{
    PipelineConfig, PlatformClass, DEFAULT_CODEC_HINT, DEFAULT_LATENCY_MS, DEFAULT_RETRY_COUNT,
    DEFAULT_SOURCE_ADDRESS,
};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformArg {
    /// Use the architecture this binary was built for
    Auto,
    EmbeddedArm,
    DesktopX86,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pipeline-rtsp-client",
    version = "0.1.0",
    author = "Hawkeye Video Pipeline",
    about = "RTSP client decoding a stream into raw frames, optionally rendered on screen"
)]
pub struct Config {
    /// RTSP source address
    #[arg(env = "RTSP_URL")]
    pub rtsp_address: Option<String>,

    /// Codec of the incoming stream (h264 or h265)
    pub codec: Option<String>,

    /// GStreamer debug level (0 disables GStreamer logging)
    #[arg(value_parser = clap::value_parser!(u8).range(0..=9))]
    pub debug_level: Option<u8>,

    /// Render decoded frames on screen
    #[arg(short = 'd', long)]
    pub display: bool,

    /// Platform class selecting the decoder chain
    #[arg(long, value_enum, default_value = "auto")]
    pub platform: PlatformArg,

    /// Connection attempts made by the RTSP source before giving up
    #[arg(long, default_value_t = DEFAULT_RETRY_COUNT)]
    pub retry: u16,

    /// Jitter buffer latency in milliseconds
    #[arg(long, default_value_t = DEFAULT_LATENCY_MS)]
    pub latency: u32,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "9003")]
    pub metrics_port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.source_address().starts_with("rtsp://") {
            anyhow::bail!("RTSP address must start with rtsp://");
        }

        Self::validate_port(self.metrics_port, "metrics")?;

        if self.retry == 0 {
            anyhow::bail!("Retry count cannot be 0");
        }

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    /// True when no positional argument was given and the built-in set applies
    pub fn uses_default_arguments(&self) -> bool {
        self.rtsp_address.is_none() && self.codec.is_none() && self.debug_level.is_none()
    }

    pub fn source_address(&self) -> &str {
        self.rtsp_address.as_deref().unwrap_or(DEFAULT_SOURCE_ADDRESS)
    }

    pub fn codec_hint(&self) -> &str {
        self.codec.as_deref().unwrap_or(DEFAULT_CODEC_HINT)
    }

    pub fn debug_level(&self) -> u8 {
        self.debug_level.unwrap_or(0)
    }

    pub fn display_enabled(&self) -> bool {
        self.display || self.uses_default_arguments()
    }

    pub fn platform_class(&self) -> PlatformClass {
        match self.platform {
            PlatformArg::Auto => PlatformClass::detect(),
            PlatformArg::EmbeddedArm => PlatformClass::EmbeddedArm,
            PlatformArg::DesktopX86 => PlatformClass::DesktopX86,
        }
    }

    pub fn to_pipeline_config(&self) -> crate::domain::errors::Result<PipelineConfig> {
        Ok(PipelineConfig::new(
            self.source_address().to_string(),
            self.codec_hint().to_string(),
            self.display_enabled(),
            self.platform_class(),
        )?
        .with_retry_count(self.retry)?
        .with_latency_ms(self.latency))
    }
}
