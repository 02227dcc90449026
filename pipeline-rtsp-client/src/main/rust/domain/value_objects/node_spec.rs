use std::fmt;

/// Position a node occupies in the decode chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Source,
    Depayer,
    Parser,
    Decoder,
    ColorConverter,
    CapsFilter,
    Transform,
    Sink,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Depayer => "depayer",
            Self::Parser => "parser",
            Self::Decoder => "decoder",
            Self::ColorConverter => "color converter",
            Self::CapsFilter => "caps filter",
            Self::Transform => "transform",
            Self::Sink => "sink",
        };
        f.write_str(name)
    }
}

/// Property assignment applied right after a node is instantiated.
///
/// Values are kept in their serialized form; the engine is responsible for
/// deserializing them into the property's native type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NodeProperty {
    pub name: String,
    pub value: String,
}

impl NodeProperty {
    pub fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Everything needed to instantiate one processing node
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NodeSpec {
    role: NodeRole,
    kind: String,
    name: String,
    properties: Vec<NodeProperty>,
}

impl NodeSpec {
    pub fn new(role: NodeRole, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role,
            kind: kind.into(),
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: impl ToString) -> Self {
        self.properties.push(NodeProperty::new(name, value));
        self
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Factory name of the element to instantiate
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Instance name inside the pipeline
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[NodeProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}
