use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// In-memory deployment plan as handed over by the plan loader: the ordered
/// resource list plus the raw input-variable declarations. The loader also
/// guarantees that graph node ids are exactly the set of resource ids.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Plan {
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub variables: IndexMap<String, Value>,
}

/// A single raw resource from the deployment plan. Immutable once loaded;
/// the plan loader guarantees ids are unique and match the dependency
/// graph's node set.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Resource {
    pub id: String,
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Resource {
    pub fn new(id: &str, resource_type: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            properties: Map::new(),
        }
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Array-of-objects property, e.g. `ingress` rule blocks. Missing or
    /// non-array values read as empty.
    pub fn object_array(&self, key: &str) -> Vec<&Map<String, Value>> {
        self.properties
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_object).collect())
            .unwrap_or_default()
    }
}

/// All string values of an array-valued key in a property object, skipping
/// anything that is not a string.
pub fn string_array(properties: &Map<String, Value>, key: &str) -> Vec<String> {
    properties
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Whether any string value nested anywhere inside `value` equals `needle`.
/// Used for reference matching over raw property bags, where providers place
/// referenced ids under differently named keys.
pub fn contains_string(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s == needle,
        Value::Array(items) => items.iter().any(|v| contains_string(v, needle)),
        Value::Object(map) => map.values().any(|v| contains_string(v, needle)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn string_array_skips_non_strings() {
        let properties = props(json!({"security_groups": ["sg-1", 42, "sg-2"]}));
        assert_eq!(
            string_array(&properties, "security_groups"),
            vec!["sg-1", "sg-2"]
        );
    }

    #[test]
    fn string_array_of_missing_key_is_empty() {
        let properties = props(json!({"other": true}));
        assert!(string_array(&properties, "security_groups").is_empty());
    }

    #[test]
    fn contains_string_searches_nested_values() {
        let value = json!({"network": {"interfaces": [{"groups": ["sg-9"]}]}});
        assert!(contains_string(&value, "sg-9"));
        assert!(!contains_string(&value, "sg-"));
    }
}
