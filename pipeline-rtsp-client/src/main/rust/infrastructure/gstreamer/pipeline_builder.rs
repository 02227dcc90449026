use crate::domain::entities::NodeGraph;
use crate::domain::value_objects::NodeSpec;

pub struct PipelineBuilder;

impl PipelineBuilder {
    /// Render a node graph as a gst-launch description.
    /// gst-launch links dynamic pads on its own, so deferred edges are written
    /// as plain `!` links as well.
    pub fn build_launch_string(graph: &NodeGraph) -> String {
        graph
            .nodes()
            .iter()
            .map(Self::describe_node)
            .collect::<Vec<_>>()
            .join(" ! ")
    }

    fn describe_node(spec: &NodeSpec) -> String {
        let mut description = format!("{} name={}", spec.kind(), spec.name());
        for property in spec.properties() {
            description.push(' ');
            description.push_str(&property.name);
            description.push('=');
            description.push_str(&Self::quote(&property.value));
        }
        description
    }

    fn quote(value: &str) -> String {
        if value.contains(|c: char| c.is_whitespace() || c == ',' || c == '(' || c == '!') {
            format!("\"{}\"", value.replace('"', "\\\""))
        } else {
            value.to_string()
        }
    }
}
