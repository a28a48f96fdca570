use anyhow::Result;
use serde_json::{Map, Value};
use tracing::debug;

use crate::loaders::is_security_group_type;
use crate::model::{SecurityGroup, SecurityGroupRule, ThreatModel};
use crate::plan::{string_array, Resource};

/// Extracts security groups and their ingress/egress rules from the raw
/// resources. Rule entries reference either CIDR literals or other security
/// group ids; malformed entries are skipped rather than fatal.
pub struct SecurityGroupsLoader<'a> {
    resources: &'a [Resource],
}

impl<'a> SecurityGroupsLoader<'a> {
    pub fn new(resources: &'a [Resource]) -> Self {
        Self { resources }
    }

    pub fn load(&self, model: &mut ThreatModel) -> Result<()> {
        for resource in self.resources {
            if !is_security_group_type(&resource.resource_type) {
                continue;
            }
            model.security_groups.push(SecurityGroup {
                id: resource.id.clone(),
                name: resource.name.clone(),
                ingress_rules: extract_rules(resource, "ingress"),
                egress_rules: extract_rules(resource, "egress"),
            });
        }
        debug!("loaded {} security groups", model.security_groups.len());
        Ok(())
    }
}

fn extract_rules(resource: &Resource, key: &str) -> Vec<SecurityGroupRule> {
    resource
        .object_array(key)
        .into_iter()
        .map(extract_rule)
        .collect()
}

fn extract_rule(block: &Map<String, Value>) -> SecurityGroupRule {
    SecurityGroupRule {
        description: block
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        protocol: block
            .get("protocol")
            .and_then(Value::as_str)
            .map(str::to_string),
        cidr_blocks: string_array(block, "cidr_blocks"),
        security_groups: string_array(block, "security_groups"),
    }
}
