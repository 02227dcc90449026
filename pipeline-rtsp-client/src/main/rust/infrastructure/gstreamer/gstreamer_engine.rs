use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gstreamer::prelude::*;

use crate::domain::entities::DeferredLink;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{MediaEngine, RunOutcome};
use crate::domain::value_objects::{NodeProperty, NodeSpec, OutputDescription, PipelineState};

/// Timeout for bus polling (100ms allows responsive shutdown)
const BUS_POLL_TIMEOUT_MS: u64 = 100;

/// [`MediaEngine`] backed by a `gstreamer::Pipeline`
pub struct GStreamerEngine {
    pipeline: Option<gstreamer::Pipeline>,
}

impl GStreamerEngine {
    /// Create an empty pipeline. GStreamer must already be initialized.
    pub fn new(name: &str) -> Self {
        Self {
            pipeline: Some(gstreamer::Pipeline::with_name(name)),
        }
    }

    /// Raise GStreamer's default log threshold to `level`. A GST_DEBUG set in
    /// the environment wins. Must run after `gstreamer::init`.
    pub fn apply_debug_level(level: u8) {
        if level == 0 || std::env::var_os("GST_DEBUG").is_some() {
            return;
        }
        gstreamer::log::set_active(true);
        gstreamer::log::set_default_threshold(Self::debug_threshold(level));
    }

    fn debug_threshold(level: u8) -> gstreamer::DebugLevel {
        match level {
            0 => gstreamer::DebugLevel::None,
            1 => gstreamer::DebugLevel::Error,
            2 => gstreamer::DebugLevel::Warning,
            3 => gstreamer::DebugLevel::Fixme,
            4 => gstreamer::DebugLevel::Info,
            5 => gstreamer::DebugLevel::Debug,
            6 => gstreamer::DebugLevel::Log,
            7 => gstreamer::DebugLevel::Trace,
            _ => gstreamer::DebugLevel::Memdump,
        }
    }

    pub fn pipeline(&self) -> Option<&gstreamer::Pipeline> {
        self.pipeline.as_ref()
    }

    fn active_pipeline(&self) -> Result<&gstreamer::Pipeline> {
        self.pipeline.as_ref().ok_or(DomainError::PipelineReleased)
    }

    fn gst_state(state: PipelineState) -> gstreamer::State {
        match state {
            PipelineState::Null => gstreamer::State::Null,
            PipelineState::Ready => gstreamer::State::Ready,
            PipelineState::Paused => gstreamer::State::Paused,
            PipelineState::Playing => gstreamer::State::Playing,
        }
    }

    /// Deserialize `property` against the element's param spec and set it.
    /// Unparsable or out-of-range values are refused instead of clamped.
    fn apply_property(
        element: &gstreamer::Element,
        property: &NodeProperty,
    ) -> std::result::Result<(), glib::BoolError> {
        let Some(pspec) = element.find_property(&property.name) else {
            tracing::warn!("{} has no property '{}', skipping", element.name(), property.name);
            return Ok(());
        };

        let value = glib::Value::deserialize(property.value.as_str(), pspec.value_type()).map_err(|_| {
            glib::bool_error!("cannot parse '{}' for property '{}'", property.value, property.name)
        })?;
        element.try_set_property_from_value(&property.name, &value)
    }

    /// Summarize the caps a freshly added pad will carry
    fn describe_output(pad: &gstreamer::Pad) -> OutputDescription {
        let caps = pad.current_caps().unwrap_or_else(|| pad.query_caps(None));
        let mut output = OutputDescription::new(pad.name().to_string(), "");

        if let Some(structure) = caps.structure(0) {
            output.media_type = structure.name().to_string();
            output.media = structure.get::<&str>("media").ok().map(str::to_owned);
        }
        output
    }

    fn process_bus_message(
        msg: &gstreamer::Message,
        pipeline: &gstreamer::Pipeline,
    ) -> std::result::Result<bool, DomainError> {
        match msg.view() {
            gstreamer::MessageView::Eos(_) => {
                tracing::info!("End of stream");
                Ok(true)
            }
            gstreamer::MessageView::Error(err) => Err(DomainError::PipelineExecutionFailed(format!(
                "Error from {:?}: {} ({:?})",
                err.src().map(|s| s.path_string()),
                err.error(),
                err.debug()
            ))),
            gstreamer::MessageView::StateChanged(state_changed) => {
                if state_changed
                    .src()
                    .map(|s| s == pipeline)
                    .unwrap_or(false)
                {
                    tracing::debug!(
                        "Pipeline state changed from {:?} to {:?}",
                        state_changed.old(),
                        state_changed.current()
                    );
                }
                Ok(false)
            }
            gstreamer::MessageView::Warning(warn) => {
                tracing::warn!(
                    "Warning from {:?}: {} ({:?})",
                    warn.src().map(|s| s.path_string()),
                    warn.error(),
                    warn.debug()
                );
                Ok(false)
            }
            _ => Ok(false),
        }
    }
}

impl MediaEngine for GStreamerEngine {
    type Element = gstreamer::Element;

    fn create_element(&mut self, spec: &NodeSpec) -> Option<gstreamer::Element> {
        let pipeline = self.pipeline.as_ref()?;

        let element = match gstreamer::ElementFactory::make(spec.kind())
            .name(spec.name())
            .build()
        {
            Ok(element) => element,
            Err(err) => {
                tracing::error!("Could not create element {} ({}): {}", spec.name(), spec.kind(), err);
                return None;
            }
        };

        for property in spec.properties() {
            if let Err(err) = Self::apply_property(&element, property) {
                tracing::error!("{}: {}", spec.name(), err);
                return None;
            }
        }

        if let Err(err) = pipeline.add(&element) {
            tracing::error!("Could not add {} to the pipeline: {}", spec.name(), err);
            return None;
        }

        tracing::debug!("Element {}: Ok", spec.name());
        Some(element)
    }

    fn link(&mut self, upstream: &gstreamer::Element, downstream: &gstreamer::Element) -> bool {
        match upstream.link(downstream) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("{} -> {}: {}", upstream.name(), downstream.name(), err);
                false
            }
        }
    }

    fn link_deferred(
        &mut self,
        upstream: &gstreamer::Element,
        downstream: &gstreamer::Element,
        link: DeferredLink,
    ) -> Result<()> {
        let sink_pad = downstream.static_pad("sink").ok_or_else(|| DomainError::Link {
            edge: format!("{} (no sink pad on {})", link.label(), downstream.name()),
        })?;

        let weak_sink: glib::WeakRef<gstreamer::Pad> = sink_pad.downgrade();
        let on_added = link.clone();
        upstream.connect_pad_added(move |src, new_pad| {
            if new_pad.direction() != gstreamer::PadDirection::Src {
                return;
            }
            // The sink pad only disappears once the pipeline has been disposed.
            let Some(sink_pad) = weak_sink.upgrade() else {
                on_added.release();
                return;
            };

            let output = Self::describe_output(new_pad);
            tracing::info!("Received new pad '{}' from '{}'", output.port, src.name());

            on_added.on_output_discovered(&output, || match new_pad.link(&sink_pad) {
                Ok(_) => true,
                Err(err) => {
                    tracing::warn!("{:?} linking '{}'", err, output.port);
                    false
                }
            });
        });

        let weak_sink: glib::WeakRef<gstreamer::Pad> = sink_pad.downgrade();
        upstream.connect_pad_removed(move |src, pad| {
            tracing::info!("Pad '{}' removed from '{}'", pad.name(), src.name());
            let still_linked = weak_sink
                .upgrade()
                .map(|sink_pad| sink_pad.is_linked())
                .unwrap_or(false);
            link.on_output_removed(still_linked);
        });

        Ok(())
    }

    fn set_state(&mut self, state: PipelineState) -> Result<()> {
        let pipeline = self.active_pipeline()?;

        pipeline
            .set_state(Self::gst_state(state))
            .map(|result| tracing::debug!("Set pipeline to {}: {:?}", state, result))
            .map_err(|e| DomainError::StateTransition {
                target: state,
                reason: e.to_string(),
            })
    }

    fn run(&mut self, running: Arc<AtomicBool>) -> Result<RunOutcome> {
        let pipeline = self.active_pipeline()?.clone();
        let bus = pipeline
            .bus()
            .ok_or_else(|| DomainError::PipelineExecutionFailed("Failed to get bus".to_string()))?;

        // Use a timed iterator to allow periodic shutdown checks
        let timeout = gstreamer::ClockTime::from_mseconds(BUS_POLL_TIMEOUT_MS);

        loop {
            if !running.load(Ordering::SeqCst) {
                tracing::info!("Shutdown signal received, leaving run loop");
                return Ok(RunOutcome::Stopped);
            }

            if let Some(msg) = bus.timed_pop(timeout) {
                if Self::process_bus_message(&msg, &pipeline)? {
                    return Ok(RunOutcome::EndOfStream);
                }
            }
        }
    }

    fn release(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if pipeline.current_state() != gstreamer::State::Null {
                let _ = pipeline.set_state(gstreamer::State::Null);
            }
            tracing::debug!("Released pipeline {}", pipeline.name());
        }
    }
}

impl Drop for GStreamerEngine {
    fn drop(&mut self) {
        self.release();
    }
}
