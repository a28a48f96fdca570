use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Provider-specific rule set translating raw resource types into
/// threat-model component kinds. Loaded and schema-validated externally;
/// immutable and shareable across conversions.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Mapping {
    /// Keyed by raw resource type, at most one rule per type. Lookup is by
    /// exact string, no pattern fallback.
    #[serde(default)]
    pub components: IndexMap<String, ComponentRule>,
}

impl Mapping {
    pub fn rule(&self, resource_type: &str) -> Option<&ComponentRule> {
        self.components.get(resource_type)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ComponentRule {
    /// Threat-model kind for components mapped by this rule.
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub attack_surface: Option<AttackSurfaceRule>,
}

/// Mapping-declared pattern that marks components of a type as reachable
/// from outside the modeled boundary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AttackSurfaceRule {
    /// Internet-facing when a related security group carries an ingress rule
    /// with an unrestricted CIDR.
    OpenIngress,
    /// Internet-facing when a graph neighbor has one of these resource types
    /// (gateways, load balancers and similar public-facing infrastructure).
    PublicAdjacency { types: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_deserializes_from_yaml() {
        let yaml = r#"
components:
  aws_instance:
    kind: ec2
    tags: [compute]
    attack_surface: open_ingress
  aws_lambda_function:
    kind: lambda
  aws_instance_public:
    kind: ec2
    attack_surface:
      public_adjacency:
        types: [aws_internet_gateway]
"#;
        let mapping: Mapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(mapping.rule("aws_instance").unwrap().kind, "ec2");
        assert_eq!(
            mapping.rule("aws_instance").unwrap().attack_surface,
            Some(AttackSurfaceRule::OpenIngress)
        );
        assert!(mapping.rule("aws_lambda_function").unwrap().attack_surface.is_none());
        assert!(mapping.rule("aws_ecs_service").is_none());

        match mapping.rule("aws_instance_public").unwrap().attack_surface.as_ref() {
            Some(AttackSurfaceRule::PublicAdjacency { types }) => {
                assert_eq!(types, &["aws_internet_gateway"]);
            }
            other => panic!("unexpected rule: {other:?}"),
        }
    }
}
