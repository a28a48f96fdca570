use anyhow::Result;
use indexmap::IndexMap;
use tracing::debug;

use crate::graph::DependencyGraph;
use crate::matchers::ComponentsAndSgsMatcher;
use crate::model::{Dataflow, ThreatModel};
use crate::transformations::Transformation;

/// Derives directed dataflows from graph edges between mapped components.
///
/// Edges fully contained in one parent/child chain describe nesting, not
/// traffic, and are skipped. An edge whose reverse was already emitted is
/// merged into one bidirectional flow, as is a pair of components whose
/// security groups reference each other symmetrically.
pub struct DataflowCreator<'a> {
    graph: &'a DependencyGraph,
}

impl<'a> DataflowCreator<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// Whether some pair of security groups, one containing each endpoint,
    /// reference each other in both directions.
    fn symmetric_security_groups(
        model: &ThreatModel,
        components_in_sgs: &IndexMap<String, Vec<String>>,
        source: &str,
        destination: &str,
    ) -> bool {
        let groups_of = |component_id: &str| -> Vec<&str> {
            components_in_sgs
                .iter()
                .filter(|(_, members)| members.iter().any(|m| m == component_id))
                .map(|(sg_id, _)| sg_id.as_str())
                .collect()
        };
        let source_groups = groups_of(source);
        let destination_groups = groups_of(destination);
        source_groups.iter().any(|sg_a| {
            destination_groups.iter().any(|sg_b| {
                let (Some(a), Some(b)) = (model.security_group(sg_a), model.security_group(sg_b))
                else {
                    return false;
                };
                a.references(&b.id) && b.references(&a.id)
            })
        })
    }
}

impl Transformation for DataflowCreator<'_> {
    fn name(&self) -> &'static str {
        "dataflows"
    }

    fn transform(&self, model: &mut ThreatModel) -> Result<()> {
        let components_in_sgs = ComponentsAndSgsMatcher::new().match_all(model, self.graph);
        let mut flows: Vec<Dataflow> = Vec::new();

        for (source, destination) in self.graph.edges() {
            if source == destination {
                continue;
            }
            // Both endpoints must resolve to mapped components; anything else
            // is dropped rather than emitted dangling.
            if model.component(source).is_none() || model.component(destination).is_none() {
                continue;
            }
            // Nesting edges are not traffic.
            if model.is_ancestor(source, destination) || model.is_ancestor(destination, source) {
                debug!("skipping hierarchy-contained edge {source} -> {destination}");
                continue;
            }
            if let Some(reverse) = flows
                .iter_mut()
                .find(|f| f.source == destination && f.destination == source)
            {
                reverse.bidirectional = true;
                continue;
            }
            if flows
                .iter()
                .any(|f| f.source == source && f.destination == destination)
            {
                continue;
            }
            let bidirectional =
                Self::symmetric_security_groups(model, &components_in_sgs, source, destination);
            flows.push(Dataflow::new(source, destination, bidirectional));
        }

        debug!("created {} dataflows", flows.len());
        model.dataflows = flows;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, SecurityGroup, SecurityGroupRule};
    use serde_json::json;

    fn component(id: &str) -> Component {
        Component::new(id, id, "aws_instance", "ec2")
    }

    fn model_with(ids: &[&str]) -> ThreatModel {
        let mut model = ThreatModel::new("p", "p");
        for id in ids {
            model.components.push(component(id));
        }
        model
    }

    #[test]
    fn creates_flow_per_cross_component_edge() {
        let mut model = model_with(&["a", "b", "c"]);
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");

        DataflowCreator::new(&graph).transform(&mut model).unwrap();

        assert_eq!(model.dataflows.len(), 2);
        assert_eq!(model.dataflows[0].source, "a");
        assert_eq!(model.dataflows[0].destination, "b");
        assert!(!model.dataflows[0].bidirectional);
    }

    #[test]
    fn drops_edges_with_unresolved_endpoints() {
        let mut model = model_with(&["a"]);
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "ghost");

        DataflowCreator::new(&graph).transform(&mut model).unwrap();

        assert!(model.dataflows.is_empty());
    }

    #[test]
    fn skips_edges_contained_in_hierarchy() {
        let mut model = model_with(&["child", "parent", "grandparent"]);
        model.assign_parent("child", "parent").unwrap();
        model.assign_parent("parent", "grandparent").unwrap();
        let mut graph = DependencyGraph::new();
        graph.add_edge("child", "parent");
        graph.add_edge("child", "grandparent");

        DataflowCreator::new(&graph).transform(&mut model).unwrap();

        assert!(model.dataflows.is_empty());
    }

    #[test]
    fn merges_reverse_edges_into_one_bidirectional_flow() {
        let mut model = model_with(&["a", "b"]);
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");

        DataflowCreator::new(&graph).transform(&mut model).unwrap();

        assert_eq!(model.dataflows.len(), 1);
        assert!(model.dataflows[0].bidirectional);
        assert_eq!(model.dataflows[0].source, "a");
    }

    #[test]
    fn symmetric_security_group_references_make_flows_bidirectional() {
        let mut model = ThreatModel::new("p", "p");
        for (id, sg) in [("a", "sg-a"), ("b", "sg-b")] {
            let mut c = component(id);
            c.raw_properties = json!({"security_groups": [sg]})
                .as_object()
                .unwrap()
                .clone();
            model.components.push(c);
        }
        for (id, other) in [("sg-a", "sg-b"), ("sg-b", "sg-a")] {
            model.security_groups.push(SecurityGroup {
                id: id.to_string(),
                name: id.to_string(),
                ingress_rules: vec![SecurityGroupRule {
                    security_groups: vec![other.to_string()],
                    ..Default::default()
                }],
                egress_rules: Vec::new(),
            });
        }
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");

        DataflowCreator::new(&graph).transform(&mut model).unwrap();

        assert_eq!(model.dataflows.len(), 1);
        assert!(model.dataflows[0].bidirectional);
    }
}
