use anyhow::Result;
use indexmap::IndexMap;
use regex::Regex;
use tracing::debug;

use crate::model::{Dataflow, ThreatModel};
use crate::transformations::Transformation;

/// Collapses structurally equivalent replicated components (autoscaled
/// instances, indexed count replicas) into one representative each.
///
/// Equivalence is computed as a grouping key, so collapsing is transitive by
/// construction and independent of pair order: same resource type, same
/// parent, same tag set, same name after stripping a trailing index token.
pub struct SingletonTransformer {
    index_suffix: Regex,
}

impl Default for SingletonTransformer {
    fn default() -> Self {
        Self {
            // svc-0, svc_1, svc.2 and plain svc0 all strip to svc.
            index_suffix: Regex::new(r"[-_.]?\d+$").unwrap(),
        }
    }
}

impl SingletonTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    fn equivalence_key(&self, model: &ThreatModel, component_id: &str) -> Option<String> {
        let component = model.component(component_id)?;
        let mut tags = component.tags.clone();
        tags.sort();
        Some(format!(
            "{}|{}|{}|{}",
            component.resource_type,
            component.parent.as_deref().unwrap_or(""),
            tags.join(","),
            self.index_suffix.replace(&component.name, ""),
        ))
    }

    /// Replaces collapsed ids in dataflows, merging duplicates and dropping
    /// flows that became self-referential.
    fn redirect_dataflows(flows: Vec<Dataflow>, replacements: &IndexMap<String, String>) -> Vec<Dataflow> {
        let mut merged: Vec<Dataflow> = Vec::new();
        for mut flow in flows {
            if let Some(replacement) = replacements.get(&flow.source) {
                flow.source = replacement.clone();
            }
            if let Some(replacement) = replacements.get(&flow.destination) {
                flow.destination = replacement.clone();
            }
            if flow.source == flow.destination {
                continue;
            }
            if let Some(existing) = merged
                .iter_mut()
                .find(|f| f.source == flow.source && f.destination == flow.destination)
            {
                existing.bidirectional |= flow.bidirectional;
                existing.internet_facing |= flow.internet_facing;
                continue;
            }
            if let Some(reverse) = merged
                .iter_mut()
                .find(|f| f.source == flow.destination && f.destination == flow.source)
            {
                reverse.bidirectional = true;
                reverse.internet_facing |= flow.internet_facing;
                continue;
            }
            merged.push(flow);
        }
        merged
    }
}

impl Transformation for SingletonTransformer {
    fn name(&self) -> &'static str {
        "singletons"
    }

    fn transform(&self, model: &mut ThreatModel) -> Result<()> {
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for component in &model.components {
            if let Some(key) = self.equivalence_key(model, &component.id) {
                groups.entry(key).or_default().push(component.id.clone());
            }
        }

        // Collapsed id to its group representative (the first member).
        let mut replacements: IndexMap<String, String> = IndexMap::new();
        for members in groups.values().filter(|members| members.len() > 1) {
            let representative = members[0].clone();
            debug!(
                "collapsing {} replicas into {representative}",
                members.len()
            );
            for duplicate in &members[1..] {
                replacements.insert(duplicate.clone(), representative.clone());
            }
        }
        if replacements.is_empty() {
            return Ok(());
        }

        for (duplicate_id, representative_id) in &replacements {
            let Some(duplicate) = model.component(duplicate_id).cloned() else {
                continue;
            };

            // The representative inherits children and exposure of every
            // duplicate it absorbs.
            for child_id in &duplicate.children {
                if let Some(child) = model.component_mut(child_id) {
                    child.parent = Some(representative_id.clone());
                }
                if let Some(representative) = model.component_mut(representative_id) {
                    representative.children.insert(child_id.clone());
                }
            }
            if duplicate.internet_facing {
                if let Some(representative) = model.component_mut(representative_id) {
                    representative.internet_facing = true;
                }
            }
            if let Some(parent_id) = &duplicate.parent {
                if let Some(parent) = model.component_mut(parent_id) {
                    parent.children.shift_remove(duplicate_id);
                }
            }
            model.components.retain(|c| &c.id != duplicate_id);
        }

        model.dataflows = Self::redirect_dataflows(std::mem::take(&mut model.dataflows), &replacements);
        Ok(())
    }
}
