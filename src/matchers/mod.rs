//! Relationship matchers answering "is A related to B" for the pairs the
//! later passes care about. Matching itself is delegated to pluggable
//! strategies so new provider idioms slot in without touching callers.

pub mod strategies;

use indexmap::IndexMap;

use crate::graph::DependencyGraph;
use crate::model::{SecurityGroup, SecurityGroupRule, ThreatModel};
use strategies::{
    ComponentSgStrategy, DirectReferenceStrategy, GraphAdjacencyStrategy, LaunchTemplateStrategy,
    MatchContext, RuleReferenceStrategy, SgPairStrategy,
};

/// Matches components against security groups. A pair is related if any of
/// the configured strategies says so.
pub struct ComponentsAndSgsMatcher {
    strategies: Vec<Box<dyn ComponentSgStrategy>>,
}

impl Default for ComponentsAndSgsMatcher {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(DirectReferenceStrategy),
                Box::new(LaunchTemplateStrategy),
                Box::new(GraphAdjacencyStrategy),
            ],
        }
    }
}

impl ComponentsAndSgsMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn are_related(
        &self,
        model: &ThreatModel,
        graph: &DependencyGraph,
        component_id: &str,
        security_group_id: &str,
    ) -> bool {
        let (Some(component), Some(security_group)) = (
            model.component(component_id),
            model.security_group(security_group_id),
        ) else {
            return false;
        };
        let context = MatchContext {
            graph,
            launch_templates: &model.launch_templates,
        };
        self.strategies
            .iter()
            .any(|strategy| strategy.are_related(component, security_group, &context))
    }

    /// Security group id to the ordered list of related component ids, built
    /// by testing every pair. Quadratic, but plan sizes are bounded in the
    /// thousands. Groups with no related components are omitted.
    pub fn match_all(
        &self,
        model: &ThreatModel,
        graph: &DependencyGraph,
    ) -> IndexMap<String, Vec<String>> {
        let context = MatchContext {
            graph,
            launch_templates: &model.launch_templates,
        };
        let mut result = IndexMap::new();
        for security_group in &model.security_groups {
            let related: Vec<String> = model
                .components
                .iter()
                .filter(|component| {
                    self.strategies
                        .iter()
                        .any(|s| s.are_related(component, security_group, &context))
                })
                .map(|component| component.id.clone())
                .collect();
            if !related.is_empty() {
                result.insert(security_group.id.clone(), related);
            }
        }
        result
    }
}

/// Matches security groups against each other through their rule sets.
pub struct SgsMatcher {
    strategies: Vec<Box<dyn SgPairStrategy>>,
}

impl Default for SgsMatcher {
    fn default() -> Self {
        Self {
            strategies: vec![Box::new(RuleReferenceStrategy)],
        }
    }
}

impl SgsMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn are_related(&self, left: &SecurityGroup, right: &SecurityGroup) -> bool {
        self.strategies
            .iter()
            .any(|strategy| strategy.are_related(left, right))
    }
}

/// Matches a rule against the security group owning it.
pub struct SgAndSgRulesMatcher;

impl SgAndSgRulesMatcher {
    pub fn is_rule_of(security_group: &SecurityGroup, rule: &SecurityGroupRule) -> bool {
        security_group.rules().any(|r| r == rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Component;
    use serde_json::json;

    fn model_with_sg_pair() -> ThreatModel {
        let mut model = ThreatModel::new("p", "p");
        let mut web = Component::new("i-web", "web", "aws_instance", "ec2");
        web.raw_properties = json!({"security_groups": ["sg-web"]})
            .as_object()
            .unwrap()
            .clone();
        model.components.push(web);
        model
            .components
            .push(Component::new("i-db", "db", "aws_instance", "ec2"));
        model.security_groups.push(SecurityGroup {
            id: "sg-web".to_string(),
            name: "web".to_string(),
            ingress_rules: vec![SecurityGroupRule {
                security_groups: vec!["sg-db".to_string()],
                ..Default::default()
            }],
            egress_rules: Vec::new(),
        });
        model.security_groups.push(SecurityGroup {
            id: "sg-db".to_string(),
            name: "db".to_string(),
            ingress_rules: Vec::new(),
            egress_rules: Vec::new(),
        });
        model
    }

    #[test]
    fn match_all_keys_by_security_group_and_omits_empty_groups() {
        let model = model_with_sg_pair();
        let mut graph = DependencyGraph::new();
        graph.add_edge("i-db", "sg-db");

        let matches = ComponentsAndSgsMatcher::new().match_all(&model, &graph);

        assert_eq!(matches["sg-web"], vec!["i-web"]);
        assert_eq!(matches["sg-db"], vec!["i-db"]);
    }

    #[test]
    fn match_all_omits_unrelated_groups() {
        let model = model_with_sg_pair();
        let graph = DependencyGraph::new();

        let matches = ComponentsAndSgsMatcher::new().match_all(&model, &graph);

        assert!(matches.contains_key("sg-web"));
        assert!(!matches.contains_key("sg-db"));
    }

    #[test]
    fn sgs_matcher_relates_groups_through_rule_references() {
        let model = model_with_sg_pair();
        let matcher = SgsMatcher::new();
        let web = model.security_group("sg-web").unwrap();
        let db = model.security_group("sg-db").unwrap();

        assert!(matcher.are_related(web, db));
        assert!(matcher.are_related(db, web));
    }

    #[test]
    fn rule_belongs_to_its_group_only() {
        let model = model_with_sg_pair();
        let web = model.security_group("sg-web").unwrap();
        let db = model.security_group("sg-db").unwrap();
        let rule = web.ingress_rules[0].clone();

        assert!(SgAndSgRulesMatcher::is_rule_of(web, &rule));
        assert!(!SgAndSgRulesMatcher::is_rule_of(db, &rule));
    }
}
