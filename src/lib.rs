//! Converts a declarative infrastructure deployment plan, its resource
//! dependency graph and a type-to-component mapping into an enriched
//! threat-model graph: typed components nested by network hierarchy,
//! connected by inferred dataflows, annotated with attack surface and
//! de-duplicated into singletons.
//!
//! Reading plan bytes, validating inputs and serializing the finished model
//! are host concerns; this crate starts from in-memory inputs and ends at the
//! populated [`model::ThreatModel`].

pub mod builder;
pub mod errors;
pub mod graph;
pub mod loaders;
pub mod mapping;
pub mod matchers;
pub mod model;
pub mod plan;
pub mod transformations;

pub use builder::ModelBuilder;
pub use errors::BuildError;
pub use graph::DependencyGraph;
pub use mapping::Mapping;
pub use model::ThreatModel;
pub use plan::{Plan, Resource};
