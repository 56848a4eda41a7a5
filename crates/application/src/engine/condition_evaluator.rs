use std::borrow::Cow;

use formloom_core::ConditionId;
use formloom_domain::{Condition, ConditionType, decoded_text};
use tracing::{debug, warn};

use super::{EvaluationScope, Forest, ReferenceResolver, UnresolvedPolicy};

/// Result of a traced evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationTrace {
    /// Boolean outcome of the evaluated node.
    pub result: bool,
    /// Ids of every node visited, in visiting order.
    pub visited: Vec<ConditionId>,
}

/// Evaluates condition trees against stored cell data.
///
/// Evaluation never fails: absent data, unknown columns and unresolved
/// references make the affected leaf `false`.
#[derive(Debug)]
pub struct ConditionEvaluator<'a> {
    conditions: Forest<'a, Condition>,
    resolver: ReferenceResolver<'a>,
}

impl<'a> ConditionEvaluator<'a> {
    /// Creates an evaluator over a condition forest.
    pub fn new(conditions: Forest<'a, Condition>, resolver: ReferenceResolver<'a>) -> Self {
        for condition in conditions.records() {
            if !condition.condition_type().is_logical()
                && conditions.children(condition.id().as_str()).next().is_some()
            {
                warn!(
                    condition_id = condition.id().as_str(),
                    condition_type = condition.condition_type().as_str(),
                    "comparison condition has children, ignoring them"
                );
            }
        }

        Self {
            conditions,
            resolver,
        }
    }

    /// Returns the condition forest.
    #[must_use]
    pub fn conditions(&self) -> &Forest<'a, Condition> {
        &self.conditions
    }

    /// Returns the reference resolver.
    #[must_use]
    pub fn resolver(&self) -> &ReferenceResolver<'a> {
        &self.resolver
    }

    /// Evaluates one condition node. Nodes excluded by a cycle are `false`.
    #[must_use]
    pub fn evaluate(&self, condition: &Condition, scope: EvaluationScope<'_>) -> bool {
        self.evaluate_node(condition, scope, None)
    }

    /// Evaluates one condition node, recording each visited node.
    #[must_use]
    pub fn evaluate_traced(
        &self,
        condition: &Condition,
        scope: EvaluationScope<'_>,
    ) -> EvaluationTrace {
        let mut visited = Vec::new();
        let result = self.evaluate_node(condition, scope, Some(&mut visited));
        EvaluationTrace { result, visited }
    }

    fn evaluate_node(
        &self,
        condition: &Condition,
        scope: EvaluationScope<'_>,
        mut visited: Option<&mut Vec<ConditionId>>,
    ) -> bool {
        if let Some(visited) = visited.as_deref_mut() {
            visited.push(condition.id().clone());
        }

        if self.conditions.is_excluded(condition.id().as_str()) {
            return false;
        }

        let mut children = self.conditions.children(condition.id().as_str());
        match condition.condition_type() {
            ConditionType::And => {
                children.all(|child| self.evaluate_node(child, scope, visited.as_deref_mut()))
            }
            ConditionType::Or => {
                children.any(|child| self.evaluate_node(child, scope, visited.as_deref_mut()))
            }
            comparison => self.evaluate_comparison(condition, comparison, scope),
        }
    }

    fn evaluate_comparison(
        &self,
        condition: &Condition,
        comparison: ConditionType,
        scope: EvaluationScope<'_>,
    ) -> bool {
        let Some(column_id) = condition.compare_column_id() else {
            debug!(
                condition_id = condition.id().as_str(),
                "comparison without a column evaluates to false"
            );
            return false;
        };
        if self.resolver.column(column_id).is_none() {
            debug!(
                condition_id = condition.id().as_str(),
                column_id = column_id.as_str(),
                "comparison against an unknown column evaluates to false"
            );
            return false;
        }

        let Some(left) = self
            .resolver
            .values()
            .resolve(column_id, scope.row_id, scope.form_id)
            .data()
        else {
            return false;
        };
        let left = decoded_text(left);
        let left = if left.contains("${") {
            match self.resolver.interpolate(&left, scope, UnresolvedPolicy::Fail) {
                Ok(resolved) => Cow::Owned(resolved),
                Err(error) => {
                    debug!(
                        condition_id = condition.id().as_str(),
                        %error,
                        "unresolved stored placeholder, condition evaluates to false"
                    );
                    return false;
                }
            }
        } else {
            left
        };

        let right = match self
            .resolver
            .resolve_operand(condition.value().unwrap_or_default(), scope)
        {
            Ok(right) => right,
            Err(error) => {
                debug!(
                    condition_id = condition.id().as_str(),
                    %error,
                    "unresolved operand, condition evaluates to false"
                );
                return false;
            }
        };

        compare(comparison, left.as_ref(), right.as_str())
    }
}

/// Compares two operands, numerically when both parse as numbers.
#[must_use]
pub fn compare(comparison: ConditionType, left: &str, right: &str) -> bool {
    let numbers = (parse_number(left), parse_number(right));
    match comparison {
        ConditionType::Equals => match numbers {
            (Some(left), Some(right)) => left == right,
            _ => left == right,
        },
        ConditionType::NotEquals => !compare(ConditionType::Equals, left, right),
        ConditionType::GreaterThan => {
            matches!(numbers, (Some(left), Some(right)) if left > right)
        }
        ConditionType::LessThan => {
            matches!(numbers, (Some(left), Some(right)) if left < right)
        }
        ConditionType::Contains => left.contains(right),
        ConditionType::StartsWith => left.starts_with(right),
        ConditionType::EndsWith => left.ends_with(right),
        ConditionType::And | ConditionType::Or => false,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

#[cfg(test)]
mod tests {
    use formloom_core::{FormId, RowId};
    use formloom_domain::{Cell, Column, Condition, ConditionType};
    use serde_json::json;

    use super::{ConditionEvaluator, compare};
    use crate::engine::{EvaluationScope, Forest, ReferenceResolver, ValueStore};

    struct Fixture {
        columns: Vec<Column>,
        cells: Vec<Cell>,
        conditions: Vec<Condition>,
    }

    impl Fixture {
        fn new(conditions: serde_json::Value) -> Self {
            Self {
                columns: serde_json::from_value(json!([
                    { "id": "voltage-correct", "name": "voltageCorrect", "type": "checkbox" },
                    { "id": "voltage", "name": "voltage", "type": "number" },
                    { "id": "serial", "name": "serial", "type": "text" },
                    { "id": "limit", "name": "limit", "type": "number" },
                    { "id": "label", "name": "label", "type": "text" },
                    { "id": "note", "name": "note", "type": "text" }
                ]))
                .unwrap_or_else(|_| unreachable!()),
                cells: serde_json::from_value(json!([
                    { "id": "c1", "ColumnId": "voltage-correct", "RowId": "cpu-424", "FormId": "inspection", "data": "false" },
                    { "id": "c2", "ColumnId": "voltage", "RowId": "cpu-424", "FormId": "inspection", "data": "12.50" },
                    { "id": "c3", "ColumnId": "serial", "RowId": "cpu-424", "FormId": "inspection", "data": "\"CPU-424-B\"" },
                    { "id": "c4", "ColumnId": "limit", "RowId": null, "FormId": "inspection", "data": "12" },
                    { "id": "c5", "ColumnId": "label", "RowId": "cpu-424", "FormId": "inspection", "data": "\"Unit ${#serial}\"" },
                    { "id": "c6", "ColumnId": "note", "RowId": "cpu-424", "FormId": "inspection", "data": "\"${#ghost}\"" }
                ]))
                .unwrap_or_else(|_| unreachable!()),
                conditions: serde_json::from_value(conditions).unwrap_or_else(|_| unreachable!()),
            }
        }

        fn evaluator(&self) -> ConditionEvaluator<'_> {
            ConditionEvaluator::new(
                Forest::build(&self.conditions),
                ReferenceResolver::new(&self.columns, ValueStore::new(&self.cells)),
            )
        }

        fn condition(&self, id: &str) -> &Condition {
            self.conditions
                .iter()
                .find(|condition| condition.id().as_str() == id)
                .unwrap_or_else(|| unreachable!())
        }
    }

    fn ids() -> (FormId, RowId) {
        (
            FormId::new("inspection").unwrap_or_else(|_| unreachable!()),
            RowId::new("cpu-424").unwrap_or_else(|_| unreachable!()),
        )
    }

    #[test]
    fn leaf_comparisons_use_numbers_when_possible() {
        let fixture = Fixture::new(json!([
            { "id": "eq", "type": "equals", "value": "false", "valueColumnId": "voltage-correct" },
            { "id": "num-eq", "type": "equals", "value": "12.5", "valueColumnId": "voltage" },
            { "id": "gt-ref", "type": "greaterThan", "value": "#limit", "valueColumnId": "voltage" },
            { "id": "gt-text", "type": "greaterThan", "value": "abc", "valueColumnId": "voltage" },
            { "id": "starts", "type": "startsWith", "value": "CPU-", "valueColumnId": "serial" },
            { "id": "contains-case", "type": "contains", "value": "cpu", "valueColumnId": "serial" }
        ]));
        let evaluator = fixture.evaluator();
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        assert!(evaluator.evaluate(fixture.condition("eq"), scope));
        assert!(evaluator.evaluate(fixture.condition("num-eq"), scope));
        assert!(evaluator.evaluate(fixture.condition("gt-ref"), scope));
        assert!(!evaluator.evaluate(fixture.condition("gt-text"), scope));
        assert!(evaluator.evaluate(fixture.condition("starts"), scope));
        assert!(!evaluator.evaluate(fixture.condition("contains-case"), scope));
    }

    #[test]
    fn missing_data_never_triggers() {
        let fixture = Fixture::new(json!([
            { "id": "no-column", "type": "equals", "value": "" },
            { "id": "unknown-column", "type": "equals", "value": "", "valueColumnId": "gone" },
            { "id": "not-equal-no-value", "type": "notEquals", "value": "x", "valueColumnId": "serial" }
        ]));
        let evaluator = fixture.evaluator();
        let (form_id, _) = ids();
        let other_row = RowId::new("psu-7").unwrap_or_else(|_| unreachable!());
        let scope = EvaluationScope::new(&form_id, Some(&other_row));

        assert!(!evaluator.evaluate(fixture.condition("no-column"), scope));
        assert!(!evaluator.evaluate(fixture.condition("unknown-column"), scope));
        assert!(!evaluator.evaluate(fixture.condition("not-equal-no-value"), scope));
    }

    #[test]
    fn empty_logical_nodes_follow_vacuous_truth() {
        let fixture = Fixture::new(json!([
            { "id": "all", "type": "and" },
            { "id": "any", "type": "or" }
        ]));
        let evaluator = fixture.evaluator();
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        assert!(evaluator.evaluate(fixture.condition("all"), scope));
        assert!(!evaluator.evaluate(fixture.condition("any"), scope));
    }

    #[test]
    fn and_short_circuits_before_unresolvable_reference() {
        let fixture = Fixture::new(json!([
            { "id": "all", "type": "and", "effect": "show", "effectLayoutId": "voltage-reason" },
            { "id": "first", "type": "equals", "value": "true", "valueColumnId": "voltage-correct", "parentConditionId": "all" },
            { "id": "second", "type": "equals", "value": "#missing#field", "valueColumnId": "serial", "parentConditionId": "all" },
            { "id": "any", "type": "or" },
            { "id": "hit", "type": "lessThan", "value": "13", "valueColumnId": "voltage", "parentConditionId": "any" },
            { "id": "skipped", "type": "equals", "value": "x", "valueColumnId": "serial", "parentConditionId": "any" }
        ]));
        let evaluator = fixture.evaluator();
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        let trace = evaluator.evaluate_traced(fixture.condition("all"), scope);
        assert!(!trace.result);
        assert_eq!(
            trace.visited.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            vec!["all", "first"]
        );

        let trace = evaluator.evaluate_traced(fixture.condition("any"), scope);
        assert!(trace.result);
        assert_eq!(trace.visited.len(), 2);
    }

    #[test]
    fn stored_placeholders_are_resolved_before_comparing() {
        let fixture = Fixture::new(json!([
            { "id": "label-eq", "type": "equals", "value": "Unit CPU-424-B", "valueColumnId": "label" },
            { "id": "label-raw", "type": "contains", "value": "${", "valueColumnId": "label" },
            { "id": "note-empty", "type": "equals", "value": "", "valueColumnId": "note" },
            { "id": "note-raw", "type": "contains", "value": "ghost", "valueColumnId": "note" }
        ]));
        let evaluator = fixture.evaluator();
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        assert!(evaluator.evaluate(fixture.condition("label-eq"), scope));
        assert!(!evaluator.evaluate(fixture.condition("label-raw"), scope));
        assert!(!evaluator.evaluate(fixture.condition("note-empty"), scope));
        assert!(!evaluator.evaluate(fixture.condition("note-raw"), scope));
    }

    #[test]
    fn self_parented_condition_evaluates_false() {
        let fixture = Fixture::new(json!([
            { "id": "c", "type": "and", "parentConditionId": "c" }
        ]));
        let evaluator = fixture.evaluator();
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        assert!(!evaluator.evaluate(fixture.condition("c"), scope));
        assert_eq!(evaluator.conditions().issues().len(), 1);
    }

    #[test]
    fn cyclic_conditions_evaluate_false() {
        let fixture = Fixture::new(json!([
            { "id": "a", "type": "and", "parentConditionId": "b" },
            { "id": "b", "type": "and", "parentConditionId": "a" }
        ]));
        let evaluator = fixture.evaluator();
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        assert!(!evaluator.evaluate(fixture.condition("a"), scope));
        assert_eq!(evaluator.conditions().issues().len(), 1);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let fixture = Fixture::new(json!([
            { "id": "eq", "type": "equals", "value": "false", "valueColumnId": "voltage-correct" }
        ]));
        let evaluator = fixture.evaluator();
        let (form_id, row_id) = ids();
        let scope = EvaluationScope::new(&form_id, Some(&row_id));

        let first = evaluator.evaluate_traced(fixture.condition("eq"), scope);
        let second = evaluator.evaluate_traced(fixture.condition("eq"), scope);
        assert_eq!(first, second);
    }

    #[test]
    fn compare_treats_text_case_sensitively() {
        assert!(compare(ConditionType::Equals, "Ok", "Ok"));
        assert!(!compare(ConditionType::Equals, "Ok", "ok"));
        assert!(compare(ConditionType::NotEquals, "1.0", "1.5"));
        assert!(!compare(ConditionType::LessThan, "", "3"));
        assert!(compare(ConditionType::EndsWith, "CPU-424", "424"));
    }
}
