use anyhow::Result;
use tracing::debug;

use crate::loaders::is_security_group_type;
use crate::mapping::Mapping;
use crate::model::{Component, ThreatModel};
use crate::plan::Resource;

/// Converts raw resources into typed components using the externally loaded
/// mapping. Resources whose type has no mapping entry are deliberately out of
/// model and skipped without error.
pub struct ResourceMapper<'a> {
    resources: &'a [Resource],
    mapping: &'a Mapping,
}

impl<'a> ResourceMapper<'a> {
    pub fn new(resources: &'a [Resource], mapping: &'a Mapping) -> Self {
        Self { resources, mapping }
    }

    pub fn load(&self, model: &mut ThreatModel) -> Result<()> {
        for resource in self.resources {
            if is_security_group_type(&resource.resource_type) {
                // Owned by the security groups loader.
                continue;
            }
            let Some(rule) = self.mapping.rule(&resource.resource_type) else {
                debug!("skipping unmapped resource type {}", resource.resource_type);
                continue;
            };
            let mut component = Component::new(
                &resource.id,
                &resource.name,
                &resource.resource_type,
                &rule.kind,
            );
            component.tags = if rule.tags.is_empty() {
                vec![resource.resource_type.clone()]
            } else {
                rule.tags.clone()
            };
            component.raw_properties = resource.properties.clone();
            model.components.push(component);
        }
        debug!("mapped {} components", model.components.len());
        Ok(())
    }
}
