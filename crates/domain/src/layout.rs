use std::str::FromStr;

use formloom_core::{AppError, AppResult, ColumnId, LayoutId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported layout node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    /// Bound input referencing a column.
    Input,
    /// Static descriptive text.
    Description,
    /// Static picture.
    Picture,
    /// Visual separator.
    Separator,
    /// Plain container.
    Group,
    /// Collapsible container.
    Accordion,
    /// Tab container.
    Tab,
}

impl LayoutType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Description => "description",
            Self::Picture => "picture",
            Self::Separator => "separator",
            Self::Group => "group",
            Self::Accordion => "accordion",
            Self::Tab => "tab",
        }
    }

    /// Returns whether nodes of this type may own children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Group | Self::Accordion | Self::Tab)
    }
}

impl FromStr for LayoutType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "input" => Ok(Self::Input),
            "description" => Ok(Self::Description),
            "picture" => Ok(Self::Picture),
            "separator" => Ok(Self::Separator),
            "group" => Ok(Self::Group),
            "accordion" => Ok(Self::Accordion),
            "tab" => Ok(Self::Tab),
            _ => Err(AppError::Validation(format!(
                "unknown layout type '{value}'"
            ))),
        }
    }
}

/// Static text settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptionSchema {
    /// Text shown to the user.
    pub text: String,
}

/// Static picture settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PictureSchema {
    /// Picture location.
    pub url: Option<String>,
    /// Optional caption.
    pub caption: Option<String>,
}

/// Group and tab settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerSchema {
    /// Optional container title.
    pub title: Option<String>,
}

/// Accordion settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccordionSchema {
    /// Optional accordion title.
    pub title: Option<String>,
    /// Whether the accordion starts collapsed.
    pub collapsed: bool,
}

/// Layout node payload, one variant per layout type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutKind {
    /// Input bound to a column.
    Input {
        /// Bound column.
        column_id: ColumnId,
    },
    /// Static text.
    Description(DescriptionSchema),
    /// Static picture.
    Picture(PictureSchema),
    /// Separator.
    Separator,
    /// Plain container.
    Group(ContainerSchema),
    /// Collapsible container.
    Accordion(AccordionSchema),
    /// Tab container.
    Tab(ContainerSchema),
}

impl LayoutKind {
    /// Returns the type tag for this payload.
    #[must_use]
    pub fn layout_type(&self) -> LayoutType {
        match self {
            Self::Input { .. } => LayoutType::Input,
            Self::Description(_) => LayoutType::Description,
            Self::Picture(_) => LayoutType::Picture,
            Self::Separator => LayoutType::Separator,
            Self::Group(_) => LayoutType::Group,
            Self::Accordion(_) => LayoutType::Accordion,
            Self::Tab(_) => LayoutType::Tab,
        }
    }

    /// Returns the bound column for input nodes.
    #[must_use]
    pub fn column_id(&self) -> Option<&ColumnId> {
        match self {
            Self::Input { column_id } => Some(column_id),
            _ => None,
        }
    }

    /// Parses a stored payload for the given type tag.
    pub fn from_payload(
        layout_type: LayoutType,
        column_id: Option<ColumnId>,
        schema: Value,
    ) -> AppResult<Self> {
        if layout_type != LayoutType::Input && column_id.is_some() {
            return Err(AppError::Validation(format!(
                "only input layouts may reference a column, got type '{}'",
                layout_type.as_str()
            )));
        }

        Ok(match layout_type {
            LayoutType::Input => Self::Input {
                column_id: column_id.ok_or_else(|| {
                    AppError::Validation("input layouts require a ColumnId".to_owned())
                })?,
            },
            LayoutType::Description => Self::Description(parse_payload(layout_type, schema)?),
            LayoutType::Picture => Self::Picture(parse_payload(layout_type, schema)?),
            LayoutType::Separator => Self::Separator,
            LayoutType::Group => Self::Group(parse_payload(layout_type, schema)?),
            LayoutType::Accordion => Self::Accordion(parse_payload(layout_type, schema)?),
            LayoutType::Tab => Self::Tab(parse_payload(layout_type, schema)?),
        })
    }

    /// Serializes the payload into its stored JSON shape.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let serialized = match self {
            Self::Input { .. } | Self::Separator => return Value::Null,
            Self::Description(schema) => serde_json::to_value(schema),
            Self::Picture(schema) => serde_json::to_value(schema),
            Self::Group(schema) | Self::Tab(schema) => serde_json::to_value(schema),
            Self::Accordion(schema) => serde_json::to_value(schema),
        };

        serialized.unwrap_or(Value::Null)
    }
}

fn parse_payload<T: DeserializeOwned>(layout_type: LayoutType, payload: Value) -> AppResult<T> {
    let payload = match payload {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };

    serde_json::from_value(payload).map_err(|error| {
        AppError::Validation(format!(
            "schema does not match layout type '{}': {error}",
            layout_type.as_str()
        ))
    })
}

/// Static requiredness of a layout node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum RequiredState {
    /// Value must be supplied.
    Required,
    /// Value may be supplied.
    Optional,
    /// Read-only or static content.
    #[default]
    Static,
}

impl RequiredState {
    /// Returns whether a value is mandatory.
    #[must_use]
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }
}

impl From<Option<bool>> for RequiredState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Required,
            Some(false) => Self::Optional,
            None => Self::Static,
        }
    }
}

impl From<RequiredState> for Option<bool> {
    fn from(value: RequiredState) -> Self {
        match value {
            RequiredState::Required => Some(true),
            RequiredState::Optional => Some(false),
            RequiredState::Static => None,
        }
    }
}

/// Positioned node in a form's presentation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayoutRecord", into = "LayoutRecord")]
pub struct Layout {
    id: LayoutId,
    name: Option<String>,
    kind: LayoutKind,
    order: Option<i64>,
    required: RequiredState,
    parent_id: Option<LayoutId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutRecord {
    id: LayoutId,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    layout_type: LayoutType,
    #[serde(default)]
    schema: Value,
    #[serde(default)]
    order: Option<i64>,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default, alias = "LayoutId", alias = "parentId")]
    layout_id: Option<LayoutId>,
    #[serde(default, alias = "ColumnId")]
    column_id: Option<ColumnId>,
}

impl TryFrom<LayoutRecord> for Layout {
    type Error = AppError;

    fn try_from(record: LayoutRecord) -> Result<Self, Self::Error> {
        let kind = LayoutKind::from_payload(record.layout_type, record.column_id, record.schema)?;
        Ok(Self::new(
            record.id,
            record.name,
            kind,
            record.order,
            RequiredState::from(record.required),
            record.layout_id,
        ))
    }
}

impl From<Layout> for LayoutRecord {
    fn from(layout: Layout) -> Self {
        Self {
            layout_type: layout.kind.layout_type(),
            schema: layout.kind.to_payload(),
            column_id: layout.kind.column_id().cloned(),
            id: layout.id,
            name: layout.name,
            order: layout.order,
            required: layout.required.into(),
            layout_id: layout.parent_id,
        }
    }
}

impl Layout {
    /// Creates a layout node.
    ///
    /// A parent that loops back to this node is kept as-is; the tree builder
    /// excludes it as a cycle.
    #[must_use]
    pub fn new(
        id: LayoutId,
        name: Option<String>,
        kind: LayoutKind,
        order: Option<i64>,
        required: RequiredState,
        parent_id: Option<LayoutId>,
    ) -> Self {
        Self {
            id,
            name: name.and_then(|value| {
                let trimmed = value.trim().to_owned();
                (!trimmed.is_empty()).then_some(trimmed)
            }),
            kind,
            order,
            required,
            parent_id,
        }
    }

    /// Returns the layout id.
    #[must_use]
    pub fn id(&self) -> &LayoutId {
        &self.id
    }

    /// Returns the optional name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the node payload.
    #[must_use]
    pub fn kind(&self) -> &LayoutKind {
        &self.kind
    }

    /// Returns the type tag.
    #[must_use]
    pub fn layout_type(&self) -> LayoutType {
        self.kind.layout_type()
    }

    /// Returns the bound column for input nodes.
    #[must_use]
    pub fn column_id(&self) -> Option<&ColumnId> {
        self.kind.column_id()
    }

    /// Returns the sibling sort key.
    #[must_use]
    pub fn order(&self) -> Option<i64> {
        self.order
    }

    /// Returns the static requiredness.
    #[must_use]
    pub fn required(&self) -> RequiredState {
        self.required
    }

    /// Returns the parent layout id, `None` for top-level forms.
    #[must_use]
    pub fn parent_id(&self) -> Option<&LayoutId> {
        self.parent_id.as_ref()
    }

    /// Returns whether this layout is a top-level form.
    #[must_use]
    pub fn is_form(&self) -> bool {
        self.parent_id.is_none()
    }
}
