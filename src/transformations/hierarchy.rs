use anyhow::Result;
use indexmap::IndexSet;
use tracing::debug;

use crate::graph::DependencyGraph;
use crate::model::ThreatModel;
use crate::transformations::Transformation;

/// Resource types that can contain other components (network and subnet-like
/// containers).
pub const PARENT_TYPES: &[&str] = &[
    "aws_subnet",
    "aws_vpc",
    "azurerm_subnet",
    "azurerm_virtual_network",
];

/// Child type to the parent types it always nests under.
pub const PARENT_TYPES_BY_CHILD_TYPE: &[(&str, &[&str])] =
    &[("aws_ecs_task_definition", &["aws_ecs_service"])];

/// Ids of components whose resource type is in `types`, in model order.
fn candidates_of_types(model: &ThreatModel, types: &[&str]) -> IndexSet<String> {
    model
        .components
        .iter()
        .filter(|c| types.contains(&c.resource_type.as_str()))
        .map(|c| c.id.clone())
        .collect()
}

/// Shared closest-relationship assignment: breadth-first search from each
/// component over the given graph orientation, nearest candidate wins, ties
/// broken by discovery order. Components with a parent already set keep it.
fn assign_closest(
    graph: &DependencyGraph,
    model: &mut ThreatModel,
    component_ids: &[String],
    candidates: &IndexSet<String>,
) -> Result<()> {
    for component_id in component_ids {
        if candidates.is_empty() {
            break;
        }
        let already_parented = model
            .component(component_id)
            .and_then(|c| c.parent.as_ref())
            .is_some();
        if already_parented {
            continue;
        }
        if let Some(parent_id) = graph.closest(component_id, candidates) {
            debug!("assigning parent {parent_id} to {component_id}");
            model.assign_parent(component_id, &parent_id)?;
        }
    }
    Ok(())
}

/// Parent pass: searches the dependency graph in its declared direction for
/// the nearest network-container ancestor of every component.
pub struct ParentCalculator<'a> {
    graph: &'a DependencyGraph,
}

impl<'a> ParentCalculator<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }
}

impl Transformation for ParentCalculator<'_> {
    fn name(&self) -> &'static str {
        "parents"
    }

    fn transform(&self, model: &mut ThreatModel) -> Result<()> {
        let candidates = candidates_of_types(model, PARENT_TYPES);
        let component_ids: Vec<String> =
            model.components.iter().map(|c| c.id.clone()).collect();
        assign_closest(self.graph, model, &component_ids, &candidates)
    }
}

/// Child pass: searches the reversed graph for the nearest descendant of a
/// fixed orchestrating-service type, for the child types that always nest
/// under one. Never overwrites a parent the parent pass assigned.
pub struct ChildrenCalculator {
    reversed: DependencyGraph,
}

impl ChildrenCalculator {
    pub fn new(graph: &DependencyGraph) -> Self {
        Self {
            reversed: graph.reversed(),
        }
    }
}

impl Transformation for ChildrenCalculator {
    fn name(&self) -> &'static str {
        "children"
    }

    fn transform(&self, model: &mut ThreatModel) -> Result<()> {
        for (child_type, parent_types) in PARENT_TYPES_BY_CHILD_TYPE {
            let candidates = candidates_of_types(model, parent_types);
            let child_ids: Vec<String> = model
                .components
                .iter()
                .filter(|c| c.resource_type == *child_type)
                .map(|c| c.id.clone())
                .collect();
            assign_closest(&self.reversed, model, &child_ids, &candidates)?;
        }
        Ok(())
    }
}
