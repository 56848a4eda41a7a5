use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON schema document attached to api columns.
///
/// Only the keywords `type`, `properties`, `required`, `items`, `enum`,
/// `minimum`, `maximum`, `minLength` and `maxLength` are enforced; any other
/// keyword is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonSchema(Value);

/// First schema violation found in a validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    path: String,
    message: String,
}

impl SchemaViolation {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: if path.is_empty() {
                "/".to_owned()
            } else {
                path.to_owned()
            },
            message: message.into(),
        }
    }

    /// Returns the pointer-like path of the offending value.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the violation description.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.path, self.message)
    }
}

impl JsonSchema {
    /// Wraps a schema document.
    #[must_use]
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    /// Returns the raw schema document.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Validates a value, returning the first violation.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        validate_node(&self.0, value, "")
    }
}

fn validate_node(schema: &Value, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    let schema = match schema {
        Value::Bool(true) => return Ok(()),
        Value::Bool(false) => return Err(SchemaViolation::new(path, "no value is allowed")),
        Value::Object(schema) => schema,
        _ => return Ok(()),
    };

    if let Some(expected) = schema.get("type") {
        check_type(expected, value, path)?;
    }

    if let Some(Value::Array(allowed)) = schema.get("enum")
        && !allowed.contains(value)
    {
        return Err(SchemaViolation::new(path, "value is not one of the allowed values"));
    }

    match value {
        Value::Number(number) => {
            if let Some(number) = number.as_f64() {
                check_bounds(schema, number, path)?;
            }
        }
        Value::String(text) => check_length(schema, text, path)?,
        Value::Object(object) => check_object(schema, object, path)?,
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (index, item) in items.iter().enumerate() {
                    validate_node(item_schema, item, &format!("{path}/{index}"))?;
                }
            }
        }
        Value::Null | Value::Bool(_) => {}
    }

    Ok(())
}

fn check_type(expected: &Value, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    let matches = match expected {
        Value::String(name) => type_matches(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| type_matches(name, value)),
        _ => true,
    };

    if matches {
        Ok(())
    } else {
        Err(SchemaViolation::new(
            path,
            format!("expected type {expected}, found {}", type_name(value)),
        ))
    }
}

fn type_matches(name: &str, value: &Value) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => match value {
            Value::Number(number) => {
                number.is_i64()
                    || number.is_u64()
                    || number.as_f64().is_some_and(|number| number.fract() == 0.0)
            }
            _ => false,
        },
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_bounds(schema: &Map<String, Value>, number: f64, path: &str) -> Result<(), SchemaViolation> {
    if let Some(minimum) = schema.get("minimum").and_then(Value::as_f64)
        && number < minimum
    {
        return Err(SchemaViolation::new(path, format!("must be at least {minimum}")));
    }

    if let Some(maximum) = schema.get("maximum").and_then(Value::as_f64)
        && number > maximum
    {
        return Err(SchemaViolation::new(path, format!("must be at most {maximum}")));
    }

    Ok(())
}

fn check_length(schema: &Map<String, Value>, text: &str, path: &str) -> Result<(), SchemaViolation> {
    let length = text.chars().count() as u64;

    if let Some(min_length) = schema.get("minLength").and_then(Value::as_u64)
        && length < min_length
    {
        return Err(SchemaViolation::new(
            path,
            format!("must be at least {min_length} characters"),
        ));
    }

    if let Some(max_length) = schema.get("maxLength").and_then(Value::as_u64)
        && length > max_length
    {
        return Err(SchemaViolation::new(
            path,
            format!("must be at most {max_length} characters"),
        ));
    }

    Ok(())
}

fn check_object(
    schema: &Map<String, Value>,
    object: &Map<String, Value>,
    path: &str,
) -> Result<(), SchemaViolation> {
    if let Some(Value::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(name) {
                return Err(SchemaViolation::new(
                    path,
                    format!("missing required property '{name}'"),
                ));
            }
        }
    }

    if let Some(Value::Object(properties)) = schema.get("properties") {
        for (name, property_schema) in properties {
            if let Some(property) = object.get(name) {
                validate_node(property_schema, property, &format!("{path}/{name}"))?;
            }
        }
    }

    Ok(())
}
