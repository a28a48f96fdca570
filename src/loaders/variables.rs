use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::model::ThreatModel;

/// Copies plan input variables with an explicit `value` into the model.
/// Variables without a value are skipped; no default resolution happens here.
pub struct VariablesLoader<'a> {
    variables: &'a IndexMap<String, Value>,
}

impl<'a> VariablesLoader<'a> {
    pub fn new(variables: &'a IndexMap<String, Value>) -> Self {
        Self { variables }
    }

    pub fn load(&self, model: &mut ThreatModel) -> Result<()> {
        for (name, declaration) in self.variables {
            if let Some(value) = extract_value(declaration) {
                model.variables.insert(name.clone(), value.clone());
            }
        }
        debug!("loaded {} variables", model.variables.len());
        Ok(())
    }
}

fn extract_value(declaration: &Value) -> Option<&Value> {
    match declaration.get("value") {
        Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value),
        None => None,
    }
}
