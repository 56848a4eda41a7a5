use std::str::FromStr;

use formloom_core::{AppError, ColumnId, ConditionId, LayoutId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported condition node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionType {
    /// All children must hold.
    And,
    /// Any child may hold.
    Or,
    /// Operands are equal.
    Equals,
    /// Operands differ.
    NotEquals,
    /// Left operand is numerically greater.
    GreaterThan,
    /// Left operand is numerically smaller.
    LessThan,
    /// Left operand text contains the right operand.
    Contains,
    /// Left operand text starts with the right operand.
    StartsWith,
    /// Left operand text ends with the right operand.
    EndsWith,
}

impl ConditionType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::GreaterThan => "greaterThan",
            Self::LessThan => "lessThan",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
        }
    }

    /// Returns whether this node composes child results.
    #[must_use]
    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl FromStr for ConditionType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "equals" => Ok(Self::Equals),
            "notEquals" => Ok(Self::NotEquals),
            "greaterThan" => Ok(Self::GreaterThan),
            "lessThan" => Ok(Self::LessThan),
            "contains" => Ok(Self::Contains),
            "startsWith" => Ok(Self::StartsWith),
            "endsWith" => Ok(Self::EndsWith),
            _ => Err(AppError::Validation(format!(
                "unknown condition type '{value}'"
            ))),
        }
    }
}

/// Effect applied to a target layout when a condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Make the target visible.
    Show,
    /// Hide the target.
    Hide,
    /// Allow edits on the target.
    Enable,
    /// Block edits on the target.
    Disable,
    /// Make the target mandatory.
    Require,
}

impl Effect {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Hide => "hide",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Require => "require",
        }
    }
}

impl FromStr for Effect {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "show" => Ok(Self::Show),
            "hide" => Ok(Self::Hide),
            "enable" => Ok(Self::Enable),
            "disable" => Ok(Self::Disable),
            "require" => Ok(Self::Require),
            _ => Err(AppError::Validation(format!("unknown effect '{value}'"))),
        }
    }
}

/// Effect a condition applies and the layout it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EffectDeclaration {
    effect: Effect,
    target_layout_id: LayoutId,
}

impl EffectDeclaration {
    /// Creates an effect declaration.
    #[must_use]
    pub fn new(effect: Effect, target_layout_id: LayoutId) -> Self {
        Self {
            effect,
            target_layout_id,
        }
    }

    /// Returns the requested effect.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Returns the targeted layout.
    #[must_use]
    pub fn target_layout_id(&self) -> &LayoutId {
        &self.target_layout_id
    }
}

/// Boolean rule node, optionally declaring an effect on a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConditionRecord", into = "ConditionRecord")]
pub struct Condition {
    id: ConditionId,
    condition_type: ConditionType,
    value: Option<String>,
    compare_column_id: Option<ColumnId>,
    effect: Option<EffectDeclaration>,
    parent_id: Option<ConditionId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionRecord {
    id: ConditionId,
    #[serde(rename = "type")]
    condition_type: ConditionType,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default, alias = "compareWidgetId")]
    value_column_id: Option<ColumnId>,
    #[serde(default)]
    effect: Option<Effect>,
    #[serde(default)]
    effect_layout_id: Option<LayoutId>,
    #[serde(default)]
    parent_condition_id: Option<ConditionId>,
}

impl TryFrom<ConditionRecord> for Condition {
    type Error = AppError;

    fn try_from(record: ConditionRecord) -> Result<Self, Self::Error> {
        let value = match record.value {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(Value::Bool(flag)) => Some(flag.to_string()),
            Some(Value::Number(number)) => Some(number.to_string()),
            Some(Value::Array(_) | Value::Object(_)) => {
                return Err(AppError::Validation(format!(
                    "condition '{}' value must be a scalar",
                    record.id.as_str()
                )));
            }
        };

        let effect = match (record.effect, record.effect_layout_id) {
            (Some(effect), Some(target)) => Some(EffectDeclaration::new(effect, target)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(AppError::Validation(format!(
                    "condition '{}' declares an effect without effectLayoutId",
                    record.id.as_str()
                )));
            }
            (None, Some(_)) => {
                return Err(AppError::Validation(format!(
                    "condition '{}' declares effectLayoutId without an effect",
                    record.id.as_str()
                )));
            }
        };

        Ok(Self::new(
            record.id,
            record.condition_type,
            value,
            record.value_column_id,
            effect,
            record.parent_condition_id,
        ))
    }
}

impl From<Condition> for ConditionRecord {
    fn from(condition: Condition) -> Self {
        let (effect, effect_layout_id) = match condition.effect {
            Some(declaration) => (Some(declaration.effect), Some(declaration.target_layout_id)),
            None => (None, None),
        };

        Self {
            id: condition.id,
            condition_type: condition.condition_type,
            value: condition.value.map(Value::String),
            value_column_id: condition.compare_column_id,
            effect,
            effect_layout_id,
            parent_condition_id: condition.parent_id,
        }
    }
}

impl Condition {
    /// Creates a condition node.
    ///
    /// A parent that loops back to this node is kept as-is; the tree builder
    /// excludes it as a cycle.
    #[must_use]
    pub fn new(
        id: ConditionId,
        condition_type: ConditionType,
        value: Option<String>,
        compare_column_id: Option<ColumnId>,
        effect: Option<EffectDeclaration>,
        parent_id: Option<ConditionId>,
    ) -> Self {
        Self {
            id,
            condition_type,
            value,
            compare_column_id,
            effect,
            parent_id,
        }
    }

    /// Returns the condition id.
    #[must_use]
    pub fn id(&self) -> &ConditionId {
        &self.id
    }

    /// Returns the node type.
    #[must_use]
    pub fn condition_type(&self) -> ConditionType {
        self.condition_type
    }

    /// Returns the right operand, a literal or a reference.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns the column providing the left operand.
    #[must_use]
    pub fn compare_column_id(&self) -> Option<&ColumnId> {
        self.compare_column_id.as_ref()
    }

    /// Returns the declared effect, if any.
    #[must_use]
    pub fn effect(&self) -> Option<&EffectDeclaration> {
        self.effect.as_ref()
    }

    /// Returns the parent condition id.
    #[must_use]
    pub fn parent_id(&self) -> Option<&ConditionId> {
        self.parent_id.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Condition, ConditionType, Effect};

    #[test]
    fn condition_accepts_storage_field_names() {
        let condition: Condition = serde_json::from_value(json!({
            "id": "cond-1",
            "type": "equals",
            "value": "false",
            "compareWidgetId": "voltage-correct",
            "effect": "show",
            "effectLayoutId": "voltage-reason"
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(condition.condition_type(), ConditionType::Equals);
        assert_eq!(
            condition.compare_column_id().map(|id| id.as_str()),
            Some("voltage-correct")
        );
        assert_eq!(
            condition.effect().map(|declaration| declaration.effect()),
            Some(Effect::Show)
        );
    }

    #[test]
    fn effect_requires_target_layout() {
        let condition = serde_json::from_value::<Condition>(json!({
            "id": "cond-2",
            "type": "equals",
            "effect": "hide"
        }));
        assert!(condition.is_err());
    }

    #[test]
    fn numeric_values_are_kept_as_text() {
        let condition: Condition = serde_json::from_value(json!({
            "id": "cond-3",
            "type": "greaterThan",
            "value": 12.5,
            "valueColumnId": "voltage"
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(condition.value(), Some("12.5"));
    }

    #[test]
    fn logical_nodes_are_flagged() {
        assert!(ConditionType::And.is_logical());
        assert!(!ConditionType::StartsWith.is_logical());
    }
}
