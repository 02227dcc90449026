use std::fmt;

/// Hardware class selecting which processing nodes are legal to instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformClass {
    /// Jetson-style ARM board with a V4L2 hardware decoder
    EmbeddedArm,
    /// x86_64 workstation decoding through a generic demuxing bin
    DesktopX86,
    Unknown,
}

impl PlatformClass {
    /// Classify the target this binary was compiled for
    pub fn detect() -> Self {
        if cfg!(any(target_arch = "aarch64", target_arch = "arm")) {
            Self::EmbeddedArm
        } else if cfg!(target_arch = "x86_64") {
            Self::DesktopX86
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for PlatformClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmbeddedArm => write!(f, "embedded-arm"),
            Self::DesktopX86 => write!(f, "desktop-x86"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
