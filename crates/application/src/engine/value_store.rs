use std::collections::HashMap;

use formloom_core::{ColumnId, FormId, RowId};
use formloom_domain::Cell;

/// Effective value of a (column, row) pair within a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveValue<'a> {
    /// Value stored for the requested row.
    Row(&'a Cell),
    /// Form-wide value used because the row has none.
    Form(&'a Cell),
    /// No data yet. Distinct from an empty string.
    NoValue,
}

impl<'a> EffectiveValue<'a> {
    /// Returns the stored data, `None` for [`EffectiveValue::NoValue`].
    #[must_use]
    pub fn data(&self) -> Option<&'a str> {
        self.cell().map(Cell::data)
    }

    /// Returns the backing cell.
    #[must_use]
    pub fn cell(&self) -> Option<&'a Cell> {
        match self {
            Self::Row(cell) | Self::Form(cell) => Some(*cell),
            Self::NoValue => None,
        }
    }

    /// Returns whether there is no stored value.
    #[must_use]
    pub fn is_no_value(&self) -> bool {
        matches!(self, Self::NoValue)
    }
}

#[derive(Debug, Default)]
struct ColumnCells<'a> {
    form_wide: Option<&'a Cell>,
    by_row: HashMap<&'a str, &'a Cell>,
}

/// Read-only index of cells keyed by form, column and optional row.
///
/// When a snapshot holds several cells for the same key, the later one wins.
#[derive(Debug, Default)]
pub struct ValueStore<'a> {
    forms: HashMap<&'a str, HashMap<&'a str, ColumnCells<'a>>>,
}

impl<'a> ValueStore<'a> {
    /// Indexes the given cells.
    pub fn new(cells: &'a [Cell]) -> Self {
        let mut forms: HashMap<&'a str, HashMap<&'a str, ColumnCells<'a>>> = HashMap::new();
        for cell in cells {
            let column_cells = forms
                .entry(cell.form_id().as_str())
                .or_default()
                .entry(cell.column_id().as_str())
                .or_default();
            match cell.row_id() {
                Some(row_id) => {
                    column_cells.by_row.insert(row_id.as_str(), cell);
                }
                None => column_cells.form_wide = Some(cell),
            }
        }

        Self { forms }
    }

    /// Resolves the effective value, falling back to the form-wide cell when
    /// the row has none.
    #[must_use]
    pub fn resolve(
        &self,
        column_id: &ColumnId,
        row_id: Option<&RowId>,
        form_id: &FormId,
    ) -> EffectiveValue<'a> {
        let Some(column_cells) = self
            .forms
            .get(form_id.as_str())
            .and_then(|columns| columns.get(column_id.as_str()))
        else {
            return EffectiveValue::NoValue;
        };

        if let Some(row_id) = row_id
            && let Some(cell) = column_cells.by_row.get(row_id.as_str())
        {
            return EffectiveValue::Row(*cell);
        }

        column_cells
            .form_wide
            .map_or(EffectiveValue::NoValue, EffectiveValue::Form)
    }
}

#[cfg(test)]
mod tests {
    use formloom_core::{CellId, ColumnId, FormId, RowId};
    use formloom_domain::Cell;

    use super::{EffectiveValue, ValueStore};

    fn column(id: &str) -> ColumnId {
        ColumnId::new(id).unwrap_or_else(|_| unreachable!())
    }

    fn row(id: &str) -> RowId {
        RowId::new(id).unwrap_or_else(|_| unreachable!())
    }

    fn form() -> FormId {
        FormId::new("inspection").unwrap_or_else(|_| unreachable!())
    }

    fn cell(id: &str, column_id: &str, row_id: Option<&str>, data: &str) -> Cell {
        Cell::new(
            CellId::new(id).unwrap_or_else(|_| unreachable!()),
            column(column_id),
            row_id.map(row),
            form(),
            data,
        )
    }

    #[test]
    fn row_value_wins_over_form_value() {
        let cells = vec![
            cell("c1", "voltage", None, "230"),
            cell("c2", "voltage", Some("cpu-424"), "231"),
        ];
        let store = ValueStore::new(&cells);

        let resolved = store.resolve(&column("voltage"), Some(&row("cpu-424")), &form());
        assert!(matches!(resolved, EffectiveValue::Row(_)));
        assert_eq!(resolved.data(), Some("231"));
    }

    #[test]
    fn missing_row_value_falls_back_to_form_value() {
        let cells = vec![cell("c1", "site", None, "\"Delft\"")];
        let store = ValueStore::new(&cells);

        let resolved = store.resolve(&column("site"), Some(&row("cpu-424")), &form());
        assert!(matches!(resolved, EffectiveValue::Form(_)));
        assert_eq!(resolved, store.resolve(&column("site"), Some(&row("cpu-424")), &form()));
    }

    #[test]
    fn absent_value_is_distinct_from_empty_string() {
        let cells = vec![cell("c1", "note", Some("cpu-424"), "")];
        let store = ValueStore::new(&cells);

        assert_eq!(
            store
                .resolve(&column("note"), Some(&row("cpu-424")), &form())
                .data(),
            Some("")
        );
        assert!(store
            .resolve(&column("note"), Some(&row("psu-7")), &form())
            .is_no_value());
        assert!(store.resolve(&column("note"), None, &form()).is_no_value());
    }

    #[test]
    fn later_duplicate_wins() {
        let cells = vec![
            cell("c1", "voltage", Some("cpu-424"), "1"),
            cell("c2", "voltage", Some("cpu-424"), "2"),
        ];
        let store = ValueStore::new(&cells);

        assert_eq!(
            store
                .resolve(&column("voltage"), Some(&row("cpu-424")), &form())
                .data(),
            Some("2")
        );
    }
}
