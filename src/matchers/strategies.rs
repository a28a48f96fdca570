use crate::graph::DependencyGraph;
use crate::model::{Component, LaunchTemplate, SecurityGroup};
use crate::plan::contains_string;

/// Shared read-only state the strategies consult.
pub struct MatchContext<'a> {
    pub graph: &'a DependencyGraph,
    pub launch_templates: &'a [LaunchTemplate],
}

/// One way of deciding whether a component belongs to a security group.
/// Relatedness differs by provider idiom, so each idiom is its own strategy
/// and the matcher ORs over a fixed set of them.
pub trait ComponentSgStrategy {
    fn are_related(
        &self,
        component: &Component,
        security_group: &SecurityGroup,
        context: &MatchContext,
    ) -> bool;
}

/// One way of deciding whether two security groups are related.
pub trait SgPairStrategy {
    fn are_related(&self, left: &SecurityGroup, right: &SecurityGroup) -> bool;
}

/// The component's raw configuration lists the security group id directly,
/// under whatever key the provider uses.
pub struct DirectReferenceStrategy;

impl ComponentSgStrategy for DirectReferenceStrategy {
    fn are_related(
        &self,
        component: &Component,
        security_group: &SecurityGroup,
        _context: &MatchContext,
    ) -> bool {
        component
            .raw_properties
            .values()
            .any(|value| contains_string(value, &security_group.id))
    }
}

/// The component is launched through a template that lists the security
/// group. The template itself is referenced either from the component's
/// configuration or by a declared graph edge.
pub struct LaunchTemplateStrategy;

impl LaunchTemplateStrategy {
    fn uses_template(component: &Component, template: &LaunchTemplate, graph: &DependencyGraph) -> bool {
        let configured = component
            .raw_properties
            .values()
            .any(|value| contains_string(value, &template.id));
        configured
            || graph.has_edge(&component.id, &template.id)
            || graph.has_edge(&template.id, &component.id)
    }
}

impl ComponentSgStrategy for LaunchTemplateStrategy {
    fn are_related(
        &self,
        component: &Component,
        security_group: &SecurityGroup,
        context: &MatchContext,
    ) -> bool {
        context.launch_templates.iter().any(|template| {
            template.security_group_ids.contains(&security_group.id)
                && Self::uses_template(component, template, context.graph)
        })
    }
}

/// A declared graph edge connects the component's resource node to the
/// security group's resource node, in either direction.
pub struct GraphAdjacencyStrategy;

impl ComponentSgStrategy for GraphAdjacencyStrategy {
    fn are_related(
        &self,
        component: &Component,
        security_group: &SecurityGroup,
        context: &MatchContext,
    ) -> bool {
        context.graph.has_edge(&component.id, &security_group.id)
            || context.graph.has_edge(&security_group.id, &component.id)
    }
}

/// Two security groups are related when either one's rule set references the
/// other's id.
pub struct RuleReferenceStrategy;

impl SgPairStrategy for RuleReferenceStrategy {
    fn are_related(&self, left: &SecurityGroup, right: &SecurityGroup) -> bool {
        left.references(&right.id) || right.references(&left.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexSet;
    use serde_json::json;

    fn component_with_props(id: &str, props: serde_json::Value) -> Component {
        let mut component = Component::new(id, id, "aws_instance", "ec2");
        component.raw_properties = props.as_object().unwrap().clone();
        component
    }

    fn security_group(id: &str) -> SecurityGroup {
        SecurityGroup {
            id: id.to_string(),
            name: id.to_string(),
            ingress_rules: Vec::new(),
            egress_rules: Vec::new(),
        }
    }

    fn template(id: &str, sg_ids: &[&str]) -> LaunchTemplate {
        LaunchTemplate {
            id: id.to_string(),
            security_group_ids: sg_ids.iter().map(|s| s.to_string()).collect::<IndexSet<_>>(),
        }
    }

    #[test]
    fn direct_reference_matches_nested_property_values() {
        let component =
            component_with_props("i-1", json!({"vpc_security_group_ids": ["sg-1"]}));
        let graph = DependencyGraph::new();
        let context = MatchContext { graph: &graph, launch_templates: &[] };

        assert!(DirectReferenceStrategy.are_related(&component, &security_group("sg-1"), &context));
        assert!(!DirectReferenceStrategy.are_related(&component, &security_group("sg-2"), &context));
    }

    #[test]
    fn launch_template_strategy_follows_graph_edge_to_template() {
        let component = component_with_props("i-1", json!({}));
        let mut graph = DependencyGraph::new();
        graph.add_edge("i-1", "lt-1");
        let templates = [template("lt-1", &["sg-1"])];
        let context = MatchContext { graph: &graph, launch_templates: &templates };

        assert!(LaunchTemplateStrategy.are_related(&component, &security_group("sg-1"), &context));
        assert!(!LaunchTemplateStrategy.are_related(&component, &security_group("sg-9"), &context));
    }

    #[test]
    fn graph_adjacency_matches_either_direction() {
        let component = component_with_props("i-1", json!({}));
        let mut graph = DependencyGraph::new();
        graph.add_edge("sg-1", "i-1");
        let context = MatchContext { graph: &graph, launch_templates: &[] };

        assert!(GraphAdjacencyStrategy.are_related(&component, &security_group("sg-1"), &context));
        assert!(!GraphAdjacencyStrategy.are_related(&component, &security_group("sg-2"), &context));
    }
}
