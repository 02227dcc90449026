mod media_type;
mod node_spec;
mod pipeline_config;
mod pipeline_state;
mod platform_class;
mod video_codec;

pub use media_type::{MediaType, OutputDescription};
pub use node_spec::{NodeProperty, NodeRole, NodeSpec};
pub use pipeline_config::{
    PipelineConfig, DEFAULT_CODEC_HINT, DEFAULT_LATENCY_MS, DEFAULT_RETRY_COUNT,
    DEFAULT_SOURCE_ADDRESS,
};
pub use pipeline_state::PipelineState;
pub use platform_class::PlatformClass;
pub use video_codec::VideoCodec;
