pub mod gstreamer;
pub mod metrics;
