use anyhow::Result;
use indexmap::IndexSet;
use tracing::debug;

use crate::loaders::is_launch_template_type;
use crate::model::{LaunchTemplate, ThreatModel};
use crate::plan::{string_array, Resource};

/// Extracts launch templates and the security groups referenced by their
/// network interfaces. Components launched through a template inherit its
/// security group membership.
pub struct LaunchTemplatesLoader<'a> {
    resources: &'a [Resource],
}

impl<'a> LaunchTemplatesLoader<'a> {
    pub fn new(resources: &'a [Resource]) -> Self {
        Self { resources }
    }

    pub fn load(&self, model: &mut ThreatModel) -> Result<()> {
        for resource in self.resources {
            if !is_launch_template_type(&resource.resource_type) {
                continue;
            }
            model.launch_templates.push(LaunchTemplate {
                id: resource.id.clone(),
                security_group_ids: security_group_ids_from_network_interfaces(resource),
            });
        }
        debug!("loaded {} launch templates", model.launch_templates.len());
        Ok(())
    }
}

fn security_group_ids_from_network_interfaces(resource: &Resource) -> IndexSet<String> {
    resource
        .object_array("network_interfaces")
        .into_iter()
        .flat_map(|interface| string_array(interface, "security_groups"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_security_groups_across_interfaces() {
        let resources = vec![Resource::new("lt-1", "aws_launch_template", "asg").with_properties(
            json!({
                "network_interfaces": [
                    {"security_groups": ["sg-1", "sg-2"]},
                    {"security_groups": ["sg-2", "sg-3"]}
                ]
            })
            .as_object()
            .unwrap()
            .clone(),
        )];
        let mut model = ThreatModel::new("p", "p");

        LaunchTemplatesLoader::new(&resources).load(&mut model).unwrap();

        let template = &model.launch_templates[0];
        let ids: Vec<&str> = template.security_group_ids.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["sg-1", "sg-2", "sg-3"]);
    }

    #[test]
    fn non_template_resources_are_ignored() {
        let resources = vec![Resource::new("i-1", "aws_instance", "web")];
        let mut model = ThreatModel::new("p", "p");

        LaunchTemplatesLoader::new(&resources).load(&mut model).unwrap();

        assert!(model.launch_templates.is_empty());
    }
}
