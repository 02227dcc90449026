mod stream_pipeline;

pub use stream_pipeline::StreamPipeline;
