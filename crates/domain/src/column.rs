use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use formloom_core::{AppError, AppResult, ColumnId, NonEmptyString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::decoded_text;
use crate::json_schema::JsonSchema;

/// Supported column (field) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Boolean tick box.
    Checkbox,
    /// Star rating.
    Star,
    /// Choice from a fixed option list.
    Dropdown,
    /// Numeric input.
    Number,
    /// Single-line text.
    Text,
    /// Multi-line text.
    #[serde(rename = "bigtext")]
    BigText,
    /// Captured signature image reference.
    Signature,
    /// Geographic position.
    Gps,
    /// Value fetched from or submitted to an external HTTP endpoint.
    Api,
}

impl ColumnType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkbox => "checkbox",
            Self::Star => "star",
            Self::Dropdown => "dropdown",
            Self::Number => "number",
            Self::Text => "text",
            Self::BigText => "bigtext",
            Self::Signature => "signature",
            Self::Gps => "gps",
            Self::Api => "api",
        }
    }
}

impl FromStr for ColumnType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "checkbox" => Ok(Self::Checkbox),
            "star" => Ok(Self::Star),
            "dropdown" => Ok(Self::Dropdown),
            "number" => Ok(Self::Number),
            "text" => Ok(Self::Text),
            "bigtext" => Ok(Self::BigText),
            "signature" => Ok(Self::Signature),
            "gps" => Ok(Self::Gps),
            "api" => Ok(Self::Api),
            _ => Err(AppError::Validation(format!(
                "unknown column type '{value}'"
            ))),
        }
    }
}

/// Checkbox settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckboxSchema {
    /// Optional label rendered next to the box.
    pub label: Option<String>,
}

/// Star rating settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StarSchema {
    /// Highest selectable rating.
    pub max: u8,
}

impl Default for StarSchema {
    fn default() -> Self {
        Self { max: 5 }
    }
}

/// One selectable dropdown option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    /// Stored option value.
    pub value: String,
    /// Optional display label.
    #[serde(default)]
    pub label: Option<String>,
}

/// Dropdown settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DropdownSchema {
    /// Selectable options.
    pub options: Vec<DropdownOption>,
    /// Whether several options may be selected.
    pub multiple: bool,
}

/// Numeric input settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberSchema {
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Inclusive upper bound.
    pub max: Option<f64>,
    /// Input step hint.
    pub step: Option<f64>,
    /// Display unit.
    pub unit: Option<String>,
}

/// Text and big-text settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextSchema {
    /// Placeholder hint.
    pub placeholder: Option<String>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
}

/// Signature settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignatureSchema {
    /// Optional caption shown under the pad.
    pub caption: Option<String>,
}

/// GPS capture settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GpsSchema {
    /// Whether the device should request a high-accuracy fix.
    pub high_accuracy: bool,
}

/// HTTP method used by an api column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiMethod {
    /// HTTP GET.
    #[default]
    #[serde(alias = "get")]
    Get,
    /// HTTP POST.
    #[serde(alias = "post")]
    Post,
    /// HTTP PUT.
    #[serde(alias = "put")]
    Put,
    /// HTTP PATCH.
    #[serde(alias = "patch")]
    Patch,
    /// HTTP DELETE.
    #[serde(alias = "delete")]
    Delete,
}

impl ApiMethod {
    /// Returns the wire method name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// Outbound request description for an api column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiRequestSchema {
    /// URL template, may contain `${#name#field}` placeholders.
    pub url: String,
    /// HTTP method.
    pub method: ApiMethod,
    /// Static request headers.
    pub headers: BTreeMap<String, String>,
    /// Optional schema the submitted request payload must satisfy.
    pub schema: Option<JsonSchema>,
}

/// Expected response description for an api column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiResponseSchema {
    /// Optional schema the response body must satisfy.
    pub schema: Option<JsonSchema>,
}

/// Api column settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSchema {
    /// Request description.
    pub request: ApiRequestSchema,
    /// Response description.
    pub response: ApiResponseSchema,
}

/// Type-specific column settings, one payload per column type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSchema {
    /// Checkbox settings.
    Checkbox(CheckboxSchema),
    /// Star rating settings.
    Star(StarSchema),
    /// Dropdown settings.
    Dropdown(DropdownSchema),
    /// Number settings.
    Number(NumberSchema),
    /// Text settings.
    Text(TextSchema),
    /// Big text settings.
    BigText(TextSchema),
    /// Signature settings.
    Signature(SignatureSchema),
    /// GPS settings.
    Gps(GpsSchema),
    /// Api settings.
    Api(ApiSchema),
}

impl ColumnSchema {
    /// Parses a stored schema payload for the given type tag.
    pub fn from_payload(column_type: ColumnType, payload: Value) -> AppResult<Self> {
        let schema = match column_type {
            ColumnType::Checkbox => Self::Checkbox(parse_payload(column_type, payload)?),
            ColumnType::Star => Self::Star(parse_payload(column_type, payload)?),
            ColumnType::Dropdown => Self::Dropdown(parse_payload(column_type, payload)?),
            ColumnType::Number => Self::Number(parse_payload(column_type, payload)?),
            ColumnType::Text => Self::Text(parse_payload(column_type, payload)?),
            ColumnType::BigText => Self::BigText(parse_payload(column_type, payload)?),
            ColumnType::Signature => Self::Signature(parse_payload(column_type, payload)?),
            ColumnType::Gps => Self::Gps(parse_payload(column_type, payload)?),
            ColumnType::Api => Self::Api(parse_payload(column_type, payload)?),
        };

        schema.validate()?;
        Ok(schema)
    }

    /// Returns the type tag matching this payload.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Checkbox(_) => ColumnType::Checkbox,
            Self::Star(_) => ColumnType::Star,
            Self::Dropdown(_) => ColumnType::Dropdown,
            Self::Number(_) => ColumnType::Number,
            Self::Text(_) => ColumnType::Text,
            Self::BigText(_) => ColumnType::BigText,
            Self::Signature(_) => ColumnType::Signature,
            Self::Gps(_) => ColumnType::Gps,
            Self::Api(_) => ColumnType::Api,
        }
    }

    /// Serializes the payload into its stored JSON shape.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let serialized = match self {
            Self::Checkbox(schema) => serde_json::to_value(schema),
            Self::Star(schema) => serde_json::to_value(schema),
            Self::Dropdown(schema) => serde_json::to_value(schema),
            Self::Number(schema) => serde_json::to_value(schema),
            Self::Text(schema) | Self::BigText(schema) => serde_json::to_value(schema),
            Self::Signature(schema) => serde_json::to_value(schema),
            Self::Gps(schema) => serde_json::to_value(schema),
            Self::Api(schema) => serde_json::to_value(schema),
        };

        serialized.unwrap_or(Value::Null)
    }

    fn validate(&self) -> AppResult<()> {
        match self {
            Self::Star(schema) => {
                if !(1..=10).contains(&schema.max) {
                    return Err(AppError::Validation(
                        "star column max must be between 1 and 10".to_owned(),
                    ));
                }
            }
            Self::Dropdown(schema) => {
                if schema.options.is_empty() {
                    return Err(AppError::Validation(
                        "dropdown columns must include at least one option".to_owned(),
                    ));
                }

                let mut seen_values = HashSet::new();
                for option in &schema.options {
                    if !seen_values.insert(option.value.as_str()) {
                        return Err(AppError::Validation(format!(
                            "duplicate dropdown option value '{}'",
                            option.value
                        )));
                    }
                }
            }
            Self::Number(schema) => {
                if let (Some(min), Some(max)) = (schema.min, schema.max)
                    && min > max
                {
                    return Err(AppError::Validation(
                        "number column min must not exceed max".to_owned(),
                    ));
                }
            }
            Self::Api(schema) => {
                if schema.request.url.trim().is_empty() {
                    return Err(AppError::Validation(
                        "api columns require schema.request.url".to_owned(),
                    ));
                }
            }
            Self::Checkbox(_)
            | Self::Text(_)
            | Self::BigText(_)
            | Self::Signature(_)
            | Self::Gps(_) => {}
        }

        Ok(())
    }
}

fn parse_payload<T: DeserializeOwned>(column_type: ColumnType, payload: Value) -> AppResult<T> {
    let payload = match payload {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };

    serde_json::from_value(payload).map_err(|error| {
        AppError::Validation(format!(
            "schema does not match column type '{}': {error}",
            column_type.as_str()
        ))
    })
}

/// Reusable field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColumnRecord", into = "ColumnRecord")]
pub struct Column {
    id: ColumnId,
    name: NonEmptyString,
    schema: ColumnSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnRecord {
    id: ColumnId,
    name: String,
    #[serde(rename = "type")]
    column_type: ColumnType,
    #[serde(default)]
    schema: Value,
}

impl TryFrom<ColumnRecord> for Column {
    type Error = AppError;

    fn try_from(record: ColumnRecord) -> Result<Self, Self::Error> {
        let schema = ColumnSchema::from_payload(record.column_type, record.schema)?;
        Self::new(record.id, record.name, schema)
    }
}

impl From<Column> for ColumnRecord {
    fn from(column: Column) -> Self {
        Self {
            column_type: column.schema.column_type(),
            schema: column.schema.to_payload(),
            id: column.id,
            name: column.name.into(),
        }
    }
}

impl Column {
    /// Creates a validated column.
    pub fn new(id: ColumnId, name: impl Into<String>, schema: ColumnSchema) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        if name.as_str().contains(['#', '{', '}']) || name.as_str().contains(char::is_whitespace)
        {
            return Err(AppError::Validation(format!(
                "column name '{}' must not contain whitespace, '#', '{{' or '}}'",
                name.as_str()
            )));
        }

        Ok(Self { id, name, schema })
    }

    /// Returns the column id.
    #[must_use]
    pub fn id(&self) -> &ColumnId {
        &self.id
    }

    /// Returns the unique reference name used by placeholders.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the type tag.
    #[must_use]
    pub fn column_type(&self) -> ColumnType {
        self.schema.column_type()
    }

    /// Returns the type-specific settings.
    #[must_use]
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Returns api settings when this is an api column.
    #[must_use]
    pub fn api_schema(&self) -> Option<&ApiSchema> {
        match &self.schema {
            ColumnSchema::Api(schema) => Some(schema),
            _ => None,
        }
    }

    /// Validates stored cell data against this column's type.
    pub fn validate_data(&self, data: &str) -> AppResult<()> {
        let text = decoded_text(data);
        let text = text.trim();
        let is_valid = match &self.schema {
            ColumnSchema::Checkbox(_) => matches!(text, "true" | "false"),
            ColumnSchema::Star(schema) => text
                .parse::<u8>()
                .is_ok_and(|rating| rating <= schema.max),
            ColumnSchema::Dropdown(schema) => {
                let allowed = |candidate: &str| {
                    schema
                        .options
                        .iter()
                        .any(|option| option.value == candidate)
                };
                if schema.multiple {
                    serde_json::from_str::<Vec<String>>(data)
                        .is_ok_and(|selected| selected.iter().all(|value| allowed(value.as_str())))
                } else {
                    allowed(text)
                }
            }
            ColumnSchema::Number(schema) => text.parse::<f64>().is_ok_and(|number| {
                number.is_finite()
                    && schema.min.is_none_or(|min| number >= min)
                    && schema.max.is_none_or(|max| number <= max)
            }),
            ColumnSchema::Text(schema) | ColumnSchema::BigText(schema) => schema
                .max_length
                .is_none_or(|max_length| text.chars().count() <= max_length),
            ColumnSchema::Signature(_) => !text.is_empty(),
            ColumnSchema::Gps(_) => serde_json::from_str::<Value>(data).is_ok_and(|value| {
                let latitude = value.get("latitude").and_then(Value::as_f64);
                let longitude = value.get("longitude").and_then(Value::as_f64);
                latitude.is_some_and(|latitude| (-90.0..=90.0).contains(&latitude))
                    && longitude.is_some_and(|longitude| (-180.0..=180.0).contains(&longitude))
            }),
            ColumnSchema::Api(_) => serde_json::from_str::<Value>(data).is_ok_and(|value| {
                value.as_object().is_some_and(|object| {
                    object
                        .keys()
                        .all(|key| matches!(key.as_str(), "request" | "response"))
                })
            }),
        };

        if !is_valid {
            return Err(AppError::Validation(format!(
                "value does not match column '{}' of type '{}'",
                self.name.as_str(),
                self.column_type().as_str()
            )));
        }

        Ok(())
    }
}
