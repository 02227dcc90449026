use crate::domain::entities::NodeGraph;
use crate::domain::errors::{DomainError, Result};
use crate::domain::value_objects::{
    MediaType, NodeRole, NodeSpec, PipelineConfig, PlatformClass, VideoCodec,
};

/// Converter output: RGBA frames kept in NVMM device memory
pub const DEVICE_RGBA_CAPS: &str = "video/x-raw(memory:NVMM), format=(string)RGBA";

/// Decides which nodes a configuration needs and how they are chained
pub struct TopologyBuilder;

impl TopologyBuilder {
    /// Plan the node graph for `config`.
    ///
    /// | platform    | display | chain                                                               |
    /// |-------------|---------|---------------------------------------------------------------------|
    /// | EmbeddedArm | yes     | source, depayer, parser, hw decoder, converter, caps, transform, display |
    /// | EmbeddedArm | no      | source, depayer, parser, hw decoder, converter, caps, discard       |
    /// | DesktopX86  | yes     | source, decodebin, converter, caps, display                         |
    /// | DesktopX86  | no      | source, decodebin, converter, caps, discard                         |
    ///
    /// `Unknown` platforms and unsupported codecs fail before any node is planned.
    pub fn plan(config: &PipelineConfig) -> Result<NodeGraph> {
        match config.platform() {
            PlatformClass::EmbeddedArm => Self::plan_embedded(config),
            PlatformClass::DesktopX86 => Ok(Self::plan_desktop(config)),
            PlatformClass::Unknown => Err(DomainError::UnsupportedPlatform),
        }
    }

    fn plan_embedded(config: &PipelineConfig) -> Result<NodeGraph> {
        let codec = VideoCodec::from_hint(config.codec_hint())?;

        let mut nodes = vec![
            Self::source(config),
            NodeSpec::new(NodeRole::Depayer, codec.depayer_kind(), "depayer_0"),
            NodeSpec::new(NodeRole::Parser, codec.parser_kind(), "parser_0"),
            NodeSpec::new(NodeRole::Decoder, "nvv4l2decoder", "nvv4l2decoder_0")
                .with_property("enable-max-performance", true)
                .with_property("enable-frame-type-reporting", false),
            Self::color_converter(),
            Self::caps_filter(),
        ];
        if config.display_enabled() {
            nodes.push(NodeSpec::new(NodeRole::Transform, "nvegltransform", "nvegl-transform"));
        }
        nodes.push(Self::sink(config.display_enabled()));

        // The decoder has a static src pad on this platform; only rtspsrc waits.
        Ok(NodeGraph::chain(nodes, &[(0, MediaType::RtpVideo)]))
    }

    fn plan_desktop(config: &PipelineConfig) -> NodeGraph {
        let nodes = vec![
            Self::source(config),
            NodeSpec::new(NodeRole::Decoder, "decodebin", "decode_container_0"),
            Self::color_converter(),
            Self::caps_filter(),
            Self::sink(config.display_enabled()),
        ];

        NodeGraph::chain(nodes, &[(0, MediaType::RtpVideo), (1, MediaType::RawVideo)])
    }

    fn source(config: &PipelineConfig) -> NodeSpec {
        NodeSpec::new(NodeRole::Source, "rtspsrc", "rtspsrc_0")
            .with_property("location", config.source_address())
            .with_property("retry", config.retry_count())
            .with_property("protocols", "tcp")
            .with_property("latency", config.latency_ms())
    }

    fn color_converter() -> NodeSpec {
        NodeSpec::new(NodeRole::ColorConverter, "nvvideoconvert", "nvidia_convertor")
    }

    fn caps_filter() -> NodeSpec {
        NodeSpec::new(NodeRole::CapsFilter, "capsfilter", "filter").with_property("caps", DEVICE_RGBA_CAPS)
    }

    fn sink(display_enabled: bool) -> NodeSpec {
        if display_enabled {
            NodeSpec::new(NodeRole::Sink, "nveglglessink", "nvvideo-renderer").with_property("sync", true)
        } else {
            NodeSpec::new(NodeRole::Sink, "fakesink", "fake_sink")
        }
    }
}
