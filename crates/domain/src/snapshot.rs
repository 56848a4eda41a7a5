use formloom_core::{FormId, LayoutId};
use serde::{Deserialize, Serialize};

use crate::{Cell, Column, Condition, Form, Layout, Row};

/// Immutable set of design-time and fill-time records evaluated together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormSnapshot {
    /// Field definitions.
    pub columns: Vec<Column>,
    /// Presentation nodes.
    pub layouts: Vec<Layout>,
    /// Rule nodes.
    pub conditions: Vec<Condition>,
    /// Repeatable data contexts.
    pub rows: Vec<Row>,
    /// Stored values.
    pub cells: Vec<Cell>,
    /// Optional form descriptors naming top-level layouts.
    pub forms: Vec<Form>,
}

impl FormSnapshot {
    /// Lists every top-level layout as a selectable form.
    ///
    /// The name comes from a matching form descriptor, else from the layout.
    #[must_use]
    pub fn forms(&self) -> Vec<Form> {
        self.layouts
            .iter()
            .filter(|layout| layout.is_form())
            .map(|layout| {
                let form_id = FormId::from(layout.id());
                let name = self
                    .forms
                    .iter()
                    .find(|form| form.id() == &form_id)
                    .and_then(|form| form.name())
                    .or_else(|| layout.name())
                    .map(str::to_owned);
                Form::new(form_id, name)
            })
            .collect()
    }

    /// Returns the layout with the given id.
    #[must_use]
    pub fn layout(&self, layout_id: &LayoutId) -> Option<&Layout> {
        self.layouts.iter().find(|layout| layout.id() == layout_id)
    }

    /// Lists rows usable with a form: global rows and rows owned by it.
    #[must_use]
    pub fn rows_for_form(&self, form_id: &FormId) -> Vec<&Row> {
        self.rows.iter().filter(|row| row.belongs_to(form_id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use formloom_core::FormId;
    use serde_json::json;

    use super::FormSnapshot;

    fn snapshot() -> FormSnapshot {
        serde_json::from_value(json!({
            "layouts": [
                { "id": "inspection", "name": "Inspection layout", "type": "group" },
                { "id": "audit", "type": "group" },
                { "id": "intro", "type": "description", "LayoutId": "inspection" }
            ],
            "rows": [
                { "id": "cpu-424", "FormId": "inspection" },
                { "id": "psu-7", "FormId": "audit" },
                { "id": "shared" }
            ],
            "forms": [{ "id": "audit", "name": "Yearly audit" }]
        }))
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn forms_are_top_level_layouts() {
        let forms = snapshot().forms();
        let names = forms
            .iter()
            .map(|form| (form.id().as_str(), form.name()))
            .collect::<Vec<_>>();

        assert_eq!(
            names,
            vec![
                ("inspection", Some("Inspection layout")),
                ("audit", Some("Yearly audit"))
            ]
        );
    }

    #[test]
    fn rows_for_form_include_global_rows() {
        let snapshot = snapshot();
        let form_id = FormId::new("inspection").unwrap_or_else(|_| unreachable!());
        let rows = snapshot
            .rows_for_form(&form_id)
            .into_iter()
            .map(|row| row.id().as_str())
            .collect::<Vec<_>>();

        assert_eq!(rows, vec!["cpu-424", "shared"]);
    }

    #[test]
    fn self_parented_records_still_load() {
        let snapshot: FormSnapshot = serde_json::from_value(json!({
            "layouts": [
                { "id": "inspection", "type": "group" },
                { "id": "loop", "type": "group", "LayoutId": "loop" }
            ],
            "conditions": [
                { "id": "c", "type": "and", "parentConditionId": "c" }
            ]
        }))
        .unwrap_or_else(|_| unreachable!());

        assert_eq!(snapshot.layouts.len(), 2);
        assert_eq!(snapshot.conditions.len(), 1);
        let forms = snapshot.forms();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id().as_str(), "inspection");
    }
}
