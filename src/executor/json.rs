//! JSON interop
//!
//! Hosts exchange values with scripts as `serde_json::Value`. Scripts,
//! commands and qualified values stay inside the engine and have no JSON form.

use std::collections::HashMap;

use serde_json::{Map, Number, Value as JsonValue};

use super::types::Val;

pub fn val_to_json(value: &Val) -> Result<JsonValue, String> {
    Ok(match value {
        Val::Nil => JsonValue::Null,
        Val::Bool(b) => JsonValue::Bool(*b),
        Val::Int(n) => JsonValue::Number((*n).into()),
        Val::Real(n) => Number::from_f64(*n)
            .map(JsonValue::Number)
            .ok_or_else(|| format!("cannot convert {} to JSON", n))?,
        Val::Str(s) => JsonValue::String(s.to_string()),
        Val::List(items) | Val::Tuple(items) => {
            JsonValue::Array(items.iter().map(val_to_json).collect::<Result<_, _>>()?)
        }
        Val::Dict(entries) => {
            let mut map = Map::new();
            for (key, item) in entries.iter() {
                map.insert(key.clone(), val_to_json(item)?);
            }
            JsonValue::Object(map)
        }
        Val::Script(_) | Val::Command(_) | Val::Qualified(_) => {
            return Err(format!("value of type {} has no JSON form", value.type_name()))
        }
    })
}

pub fn json_to_val(value: &JsonValue) -> Val {
    match value {
        JsonValue::Null => Val::Nil,
        JsonValue::Bool(b) => Val::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Val::Int(i),
            None => Val::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => Val::from(s.as_str()),
        JsonValue::Array(items) => Val::list(items.iter().map(json_to_val).collect()),
        JsonValue::Object(map) => Val::dict(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_val(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;
    use serde_json::json;

    #[test]
    fn test_json_to_val() {
        let value = json_to_val(&json!({"n": 1, "r": 1.5, "l": [true, null], "s": "x"}));
        assert_eq!(
            value,
            Val::dict(hashmap! {
                "n".to_string() => Val::Int(1),
                "r".to_string() => Val::Real(1.5),
                "l".to_string() => Val::list(vec![Val::Bool(true), Val::Nil]),
                "s".to_string() => Val::from("x"),
            })
        );
    }

    #[test]
    fn test_val_to_json() {
        let value = Val::tuple(vec![Val::Int(2), Val::from("a")]);
        assert_eq!(val_to_json(&value), Ok(json!([2, "a"])));

        let script = Val::script(Default::default(), Some(""));
        assert_eq!(
            val_to_json(&script),
            Err("value of type script has no JSON form".to_string())
        );
    }
}
