use std::collections::HashMap;

use formloom_core::{ColumnId, FormId, RowId};
use formloom_domain::{Column, Reference, TemplateSegment, decoded_text, parse_template};
use serde_json::Value;

use super::{EffectiveValue, FormEngineError, ValueStore};

/// Form and row a resolution or evaluation pass is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationScope<'s> {
    /// Selected form.
    pub form_id: &'s FormId,
    /// Selected row, `None` for form-wide evaluation.
    pub row_id: Option<&'s RowId>,
}

impl<'s> EvaluationScope<'s> {
    /// Creates a scope.
    #[must_use]
    pub fn new(form_id: &'s FormId, row_id: Option<&'s RowId>) -> Self {
        Self { form_id, row_id }
    }
}

/// What to do with a placeholder that cannot be resolved inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    /// Substitute an empty segment.
    Blank,
    /// Abort with [`FormEngineError::UnresolvedReference`].
    Fail,
}

/// Resolves `#name#field` placeholders against stored cell data.
#[derive(Debug)]
pub struct ReferenceResolver<'a> {
    columns_by_name: HashMap<&'a str, &'a Column>,
    columns_by_id: HashMap<&'a str, &'a Column>,
    values: ValueStore<'a>,
}

impl<'a> ReferenceResolver<'a> {
    /// Creates a resolver over the given columns and value index.
    pub fn new(columns: &'a [Column], values: ValueStore<'a>) -> Self {
        Self {
            columns_by_name: columns
                .iter()
                .map(|column| (column.name().as_str(), column))
                .collect(),
            columns_by_id: columns
                .iter()
                .map(|column| (column.id().as_str(), column))
                .collect(),
            values,
        }
    }

    /// Returns the underlying value index.
    #[must_use]
    pub fn values(&self) -> &ValueStore<'a> {
        &self.values
    }

    /// Returns the column with the given id.
    #[must_use]
    pub fn column(&self, column_id: &ColumnId) -> Option<&'a Column> {
        self.columns_by_id.get(column_id.as_str()).copied()
    }

    /// Returns the column with the given unique name.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&'a Column> {
        self.columns_by_name.get(name).copied()
    }

    /// Resolves a reference to its stored value, or to the field selected by
    /// its path.
    pub fn resolve(
        &self,
        reference: &Reference,
        scope: EvaluationScope<'_>,
    ) -> Result<Value, FormEngineError> {
        let unresolved = |reason: String| FormEngineError::UnresolvedReference {
            reference: reference.to_string(),
            reason,
        };

        let column = self
            .column_by_name(reference.column_name())
            .ok_or_else(|| unresolved("unknown column".to_owned()))?;
        let data = match self.values.resolve(column.id(), scope.row_id, scope.form_id) {
            EffectiveValue::NoValue => return Err(unresolved("no value".to_owned())),
            value => value.data().unwrap_or_default(),
        };

        if reference.path().is_empty() {
            return Ok(Value::String(decoded_text(data).into_owned()));
        }

        let document = serde_json::from_str::<Value>(data)
            .map_err(|_| unresolved("stored value is not structured".to_owned()))?;
        let mut current = &document;
        for segment in reference.path() {
            let next = match current {
                Value::Object(object) => object.get(segment.as_str()),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|position| items.get(position)),
                _ => None,
            };
            current = next.ok_or_else(|| unresolved(format!("field '{segment}' not found")))?;
        }

        if current.is_null() {
            return Err(unresolved("field is null".to_owned()));
        }

        Ok(current.clone())
    }

    /// Resolves a condition operand: a bare reference, a template with
    /// placeholders, or literal text.
    pub fn resolve_operand(
        &self,
        operand: &str,
        scope: EvaluationScope<'_>,
    ) -> Result<String, FormEngineError> {
        if let Some(reference) = Reference::try_parse(operand) {
            return self
                .resolve(&reference, scope)
                .map(|value| value_to_text(&value));
        }

        if operand.contains("${") {
            return self.interpolate(operand, scope, UnresolvedPolicy::Fail);
        }

        Ok(operand.to_owned())
    }

    /// Substitutes every `${#name#field}` placeholder in a template.
    pub fn interpolate(
        &self,
        template: &str,
        scope: EvaluationScope<'_>,
        policy: UnresolvedPolicy,
    ) -> Result<String, FormEngineError> {
        let mut result = String::with_capacity(template.len());
        for segment in parse_template(template) {
            match segment {
                TemplateSegment::Literal(text) => result.push_str(text),
                TemplateSegment::Placeholder(reference) => match self.resolve(&reference, scope) {
                    Ok(value) => result.push_str(value_to_text(&value).as_str()),
                    Err(error) => match policy {
                        UnresolvedPolicy::Blank => {}
                        UnresolvedPolicy::Fail => return Err(error),
                    },
                },
            }
        }

        Ok(result)
    }
}

/// Returns the comparable text form of a resolved value.
#[must_use]
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(content) => content.clone(),
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use formloom_core::{FormId, RowId};
    use formloom_domain::{Cell, Column, Reference};
    use serde_json::json;

    use super::{EvaluationScope, ReferenceResolver, UnresolvedPolicy};
    use crate::engine::{FormEngineError, ValueStore};

    fn columns() -> Vec<Column> {
        serde_json::from_value(json!([
            { "id": "col-serial", "name": "serial", "type": "text" },
            { "id": "col-gps", "name": "position", "type": "gps" },
            { "id": "col-note", "name": "note", "type": "text" }
        ]))
        .unwrap_or_else(|_| unreachable!())
    }

    fn cells() -> Vec<Cell> {
        serde_json::from_value(json!([
            { "id": "c1", "ColumnId": "col-serial", "RowId": "cpu-424", "FormId": "inspection", "data": "\"CPU 424\"" },
            { "id": "c2", "ColumnId": "col-gps", "RowId": null, "FormId": "inspection",
              "data": "{\"latitude\":52.01,\"longitude\":4.36}" }
        ]))
        .unwrap_or_else(|_| unreachable!())
    }

    fn ids() -> (FormId, RowId) {
        (
            FormId::new("inspection").unwrap_or_else(|_| unreachable!()),
            RowId::new("cpu-424").unwrap_or_else(|_| unreachable!()),
        )
    }

    #[test]
    fn resolves_whole_values_and_fields() {
        let (columns, cells) = (columns(), cells());
        let resolver = ReferenceResolver::new(&columns, ValueStore::new(&cells));
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        let serial = resolver.resolve(
            &Reference::parse("#serial").unwrap_or_else(|_| unreachable!()),
            scope,
        );
        let latitude = resolver.resolve(
            &Reference::parse("#position#latitude").unwrap_or_else(|_| unreachable!()),
            scope,
        );

        assert_eq!(serial, Ok(json!("CPU 424")));
        assert_eq!(latitude, Ok(json!(52.01)));
    }

    #[test]
    fn unknown_columns_and_missing_values_are_unresolved() {
        let (columns, cells) = (columns(), cells());
        let resolver = ReferenceResolver::new(&columns, ValueStore::new(&cells));
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        for token in ["#missing", "#note", "#position#altitude", "#serial#length"] {
            let reference = Reference::parse(token).unwrap_or_else(|_| unreachable!());
            assert!(matches!(
                resolver.resolve(&reference, scope),
                Err(FormEngineError::UnresolvedReference { .. })
            ));
        }
    }

    #[test]
    fn interpolation_policy_is_explicit() {
        let (columns, cells) = (columns(), cells());
        let resolver = ReferenceResolver::new(&columns, ValueStore::new(&cells));
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));
        let template = "https://devices.test/${#serial}?lat=${#position#latitude}&note=${#note}";

        assert_eq!(
            resolver.interpolate(template, scope, UnresolvedPolicy::Blank),
            Ok("https://devices.test/CPU 424?lat=52.01&note=".to_owned())
        );
        assert!(resolver
            .interpolate(template, scope, UnresolvedPolicy::Fail)
            .is_err());
    }

    #[test]
    fn literal_operands_pass_through() {
        let (columns, cells) = (columns(), cells());
        let resolver = ReferenceResolver::new(&columns, ValueStore::new(&cells));
        let (form_id, _) = ids();
        let scope = EvaluationScope::new(&form_id, None);

        assert_eq!(resolver.resolve_operand("false", scope), Ok("false".to_owned()));
        assert_eq!(
            resolver.resolve_operand("#position#longitude", scope),
            Ok("4.36".to_owned())
        );
    }
}
