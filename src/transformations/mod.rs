//! Enrichment passes over the shared model. Each pass mutates the model in
//! place and must complete before the next starts; the orchestrator owns the
//! fixed execution order.

pub mod attack_surface;
pub mod dataflows;
pub mod hierarchy;
pub mod singletons;

pub use attack_surface::AttackSurfaceCalculator;
pub use dataflows::DataflowCreator;
pub use hierarchy::{ChildrenCalculator, ParentCalculator};
pub use singletons::SingletonTransformer;

use anyhow::Result;

use crate::model::ThreatModel;

/// A single enrichment pass. Implementations hold whatever read-only context
/// they need (graph, mapping, raw resources) and receive the model to mutate.
pub trait Transformation {
    fn name(&self) -> &'static str;

    fn transform(&self, model: &mut ThreatModel) -> Result<()>;
}
