use std::collections::HashSet;

use anyhow::{bail, Result};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// A typed threat-model component derived from one raw resource.
///
/// `parent` and `children` are two views of the same hierarchy edge and are
/// only ever written through [`ThreatModel::assign_parent`], which keeps them
/// consistent.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Component {
    pub id: String,
    pub name: String,
    /// Raw resource type the component was mapped from.
    pub resource_type: String,
    /// Threat-model kind assigned by the mapping rule.
    pub kind: String,
    pub parent: Option<String>,
    pub children: IndexSet<String>,
    pub tags: Vec<String>,
    pub internet_facing: bool,
    #[serde(default)]
    pub raw_properties: Map<String, Value>,
}

impl Component {
    pub fn new(id: &str, name: &str, resource_type: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            resource_type: resource_type.to_string(),
            kind: kind.to_string(),
            parent: None,
            children: IndexSet::new(),
            tags: Vec::new(),
            internet_facing: false,
            raw_properties: Map::new(),
        }
    }
}

/// One ingress or egress rule of a security group. References are either
/// literal CIDR ranges or ids of other security groups.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SecurityGroupRule {
    pub description: Option<String>,
    pub protocol: Option<String>,
    pub cidr_blocks: Vec<String>,
    pub security_groups: Vec<String>,
}

impl SecurityGroupRule {
    /// Whether the rule admits traffic from anywhere.
    pub fn is_unrestricted(&self) -> bool {
        self.cidr_blocks
            .iter()
            .any(|cidr| cidr == "0.0.0.0/0" || cidr == "::/0")
    }

    pub fn references(&self, security_group_id: &str) -> bool {
        self.security_groups.iter().any(|id| id == security_group_id)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub ingress_rules: Vec<SecurityGroupRule>,
    pub egress_rules: Vec<SecurityGroupRule>,
}

impl SecurityGroup {
    pub fn rules(&self) -> impl Iterator<Item = &SecurityGroupRule> {
        self.ingress_rules.iter().chain(self.egress_rules.iter())
    }

    pub fn references(&self, security_group_id: &str) -> bool {
        self.rules().any(|rule| rule.references(security_group_id))
    }
}

/// Launch template carrying the security groups a component launched through
/// it inherits.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LaunchTemplate {
    pub id: String,
    pub security_group_ids: IndexSet<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Dataflow {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub bidirectional: bool,
    pub internet_facing: bool,
}

impl Dataflow {
    pub fn new(source: &str, destination: &str, bidirectional: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            bidirectional,
            internet_facing: false,
        }
    }

}

/// Aggregate root for one conversion. Created empty by the orchestrator,
/// populated stage by stage, handed off complete.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ThreatModel {
    pub project_id: String,
    pub project_name: String,
    pub components: Vec<Component>,
    pub security_groups: Vec<SecurityGroup>,
    pub launch_templates: Vec<LaunchTemplate>,
    pub variables: IndexMap<String, Value>,
    pub dataflows: Vec<Dataflow>,
}

impl ThreatModel {
    pub fn new(project_id: &str, project_name: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            project_name: project_name.to_string(),
            ..Default::default()
        }
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn security_group(&self, id: &str) -> Option<&SecurityGroup> {
        self.security_groups.iter().find(|sg| sg.id == id)
    }

    /// Sets `parent` on `child_id` and mirrors the edge into the parent's
    /// children set. A parent assigned by an earlier pass wins; later calls
    /// for the same child are ignored. The hierarchy must stay a tree, so an
    /// assignment that would close a cycle (the candidate parent already
    /// descends from the child) is skipped as well.
    pub fn assign_parent(&mut self, child_id: &str, parent_id: &str) -> Result<()> {
        if self.component(parent_id).is_none() {
            bail!("parent component {parent_id} does not exist");
        }
        if self.component(child_id).is_none() {
            bail!("child component {child_id} does not exist");
        }
        if child_id == parent_id || self.is_ancestor(child_id, parent_id) {
            debug!("skipping parent {parent_id} for {child_id}: would close a cycle");
            return Ok(());
        }
        let Some(child) = self.component_mut(child_id) else {
            bail!("child component {child_id} does not exist");
        };
        if child.parent.is_some() {
            return Ok(());
        }
        child.parent = Some(parent_id.to_string());
        if let Some(parent) = self.component_mut(parent_id) {
            parent.children.insert(child_id.to_string());
        }
        Ok(())
    }

    /// Whether `ancestor_id` appears on the parent chain of `component_id`.
    /// Terminates on malformed (cyclic) chains instead of spinning.
    pub fn is_ancestor(&self, ancestor_id: &str, component_id: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = self.component(component_id).and_then(|c| c.parent.as_deref());
        while let Some(parent_id) = current {
            if parent_id == ancestor_id {
                return true;
            }
            if !visited.insert(parent_id) {
                return false;
            }
            current = self.component(parent_id).and_then(|c| c.parent.as_deref());
        }
        false
    }

    /// Verifies the hierarchy invariants: every parent link is mirrored by a
    /// children entry and vice versa, and parent chains form a tree (no
    /// cycles).
    pub fn check_hierarchy(&self) -> Result<()> {
        for component in &self.components {
            let mut visited: HashSet<&str> = HashSet::new();
            let mut current = component.parent.as_deref();
            while let Some(parent_id) = current {
                if parent_id == component.id || !visited.insert(parent_id) {
                    bail!("parent chain of {} contains a cycle", component.id);
                }
                current = self.component(parent_id).and_then(|c| c.parent.as_deref());
            }
            if let Some(parent_id) = &component.parent {
                let Some(parent) = self.component(parent_id) else {
                    bail!("component {} has dangling parent {parent_id}", component.id);
                };
                if !parent.children.contains(&component.id) {
                    bail!(
                        "component {} missing from children of {parent_id}",
                        component.id
                    );
                }
            }
            for child_id in &component.children {
                match self.component(child_id) {
                    Some(child) if child.parent.as_deref() == Some(component.id.as_str()) => {}
                    _ => bail!(
                        "child {child_id} of {} does not point back to it",
                        component.id
                    ),
                }
            }
        }
        Ok(())
    }
}
