mod gstreamer_engine;
mod pipeline_builder;

pub use gstreamer_engine::GStreamerEngine;
pub use pipeline_builder::PipelineBuilder;
