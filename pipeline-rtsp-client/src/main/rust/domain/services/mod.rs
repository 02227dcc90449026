mod topology_builder;

pub use topology_builder::TopologyBuilder;
