// Provider loading from JSON files
use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::providers::base::Provider;
use crate::providers::decode_value;

/// Load every provider described in a JSON file.
///
/// Accepted layouts:
/// - `[{"provider_type": "http", ...}, ...]`
/// - `{"providers": [{...}, ...]}` or `{"providers": {...}}`
/// - a single provider object
pub async fn load_providers_from_file(
    path: impl AsRef<Path>,
    config: &BridgeConfig,
) -> Result<Vec<Arc<dyn Provider>>> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read providers file {}", path.display()))?;
    let json: Value = serde_json::from_str(&contents)?;
    let variables = config.resolved_variables().await;
    let pattern = variable_pattern()?;

    parse_providers_json(json)?
        .into_iter()
        .enumerate()
        .map(|(index, mut value)| {
            substitute_variables(&mut value, &pattern, &variables);
            create_provider_from_value(value, index)
        })
        .collect()
}

fn parse_providers_json(json: Value) -> Result<Vec<Value>> {
    match json {
        Value::Array(arr) => Ok(arr),
        Value::Object(mut obj) => match obj.remove("providers") {
            Some(Value::Array(arr)) => Ok(arr),
            Some(single @ Value::Object(_)) => Ok(vec![single]),
            Some(_) => Err(anyhow!("'providers' field must be an array or object")),
            None => Ok(vec![Value::Object(obj)]),
        },
        _ => Err(anyhow!("JSON root must be array or object")),
    }
}

fn create_provider_from_value(mut value: Value, index: usize) -> Result<Arc<dyn Provider>> {
    let obj = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("provider at index {} must be an object", index))?;

    if !obj.contains_key("name") {
        let tag = obj
            .get("provider_type")
            .and_then(Value::as_str)
            .unwrap_or("provider")
            .to_string();
        obj.insert("name".to_string(), Value::String(format!("{}_{}", tag, index)));
    }

    let descriptor =
        decode_value(value).with_context(|| format!("invalid provider at index {}", index))?;
    Ok(descriptor.into_provider())
}

fn variable_pattern() -> Result<Regex> {
    Ok(Regex::new(r"\$\{(\w+)\}|\$(\w+)")?)
}

/// Replace `${VAR}` and `$VAR` in every string value. Names match whole
/// words; unknown names are left as written.
fn substitute_variables(value: &mut Value, pattern: &Regex, variables: &HashMap<String, String>) {
    match value {
        Value::String(s) if s.contains('$') => {
            let replaced = pattern.replace_all(s, |caps: &Captures| {
                let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                match variables.get(name) {
                    Some(val) => val.clone(),
                    None => caps[0].to_string(),
                }
            });
            *s = replaced.into_owned();
        }
        Value::Object(obj) => obj
            .values_mut()
            .for_each(|v| substitute_variables(v, pattern, variables)),
        Value::Array(arr) => arr
            .iter_mut()
            .for_each(|v| substitute_variables(v, pattern, variables)),
        _ => {}
    }
}
