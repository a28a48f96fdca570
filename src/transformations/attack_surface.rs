use std::collections::HashMap;

use anyhow::Result;
use tracing::debug;

use crate::graph::DependencyGraph;
use crate::mapping::{AttackSurfaceRule, Mapping};
use crate::matchers::ComponentsAndSgsMatcher;
use crate::plan::Resource;
use crate::transformations::Transformation;
use crate::model::ThreatModel;

/// Flags components reachable from outside the modeled boundary, per the
/// attack-surface rule their mapping entry declares. Marking is additive
/// only; nothing in this pass ever clears a flag.
pub struct AttackSurfaceCalculator<'a> {
    graph: &'a DependencyGraph,
    mapping: &'a Mapping,
    resource_types: HashMap<&'a str, &'a str>,
}

impl<'a> AttackSurfaceCalculator<'a> {
    pub fn new(graph: &'a DependencyGraph, mapping: &'a Mapping, resources: &'a [Resource]) -> Self {
        Self {
            graph,
            mapping,
            resource_types: resources
                .iter()
                .map(|r| (r.id.as_str(), r.resource_type.as_str()))
                .collect(),
        }
    }

    /// Whether the component sits in a security group with an ingress rule
    /// open to the world.
    fn has_open_ingress(&self, model: &ThreatModel, component_id: &str) -> bool {
        let matcher = ComponentsAndSgsMatcher::new();
        model.security_groups.iter().any(|sg| {
            sg.ingress_rules.iter().any(|rule| rule.is_unrestricted())
                && matcher.are_related(model, self.graph, component_id, &sg.id)
        })
    }

    /// Whether any graph neighbor of the component is one of the declared
    /// public-facing resource types.
    fn has_public_neighbor(&self, component_id: &str, types: &[String]) -> bool {
        self.graph.neighbors(component_id).into_iter().any(|neighbor| {
            self.resource_types
                .get(neighbor)
                .is_some_and(|t| types.iter().any(|declared| declared == t))
        })
    }
}

impl Transformation for AttackSurfaceCalculator<'_> {
    fn name(&self) -> &'static str {
        "attack surface"
    }

    fn transform(&self, model: &mut ThreatModel) -> Result<()> {
        let mut exposed: Vec<String> = Vec::new();
        for component in &model.components {
            let Some(rule) = self
                .mapping
                .rule(&component.resource_type)
                .and_then(|r| r.attack_surface.as_ref())
            else {
                continue;
            };
            let facing = match rule {
                AttackSurfaceRule::OpenIngress => self.has_open_ingress(model, &component.id),
                AttackSurfaceRule::PublicAdjacency { types } => {
                    self.has_public_neighbor(&component.id, types)
                }
            };
            if facing {
                exposed.push(component.id.clone());
            }
        }

        for component_id in exposed {
            debug!("marking {component_id} as internet facing");
            if let Some(component) = model.component_mut(&component_id) {
                component.internet_facing = true;
            }
            for flow in &mut model.dataflows {
                if flow.destination == component_id {
                    flow.internet_facing = true;
                }
            }
        }
        Ok(())
    }
}
