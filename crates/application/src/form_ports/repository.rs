use async_trait::async_trait;
use formloom_core::{AppResult, ColumnId, FormId, RowId};
use formloom_domain::{Cell, Form, FormSnapshot};

/// Cell upsert keyed by (form, row, column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    /// Owning form.
    pub form_id: FormId,
    /// Row, `None` for a form-wide value.
    pub row_id: Option<RowId>,
    /// Written column.
    pub column_id: ColumnId,
    /// Raw data to store.
    pub data: String,
}

/// Port for form record storage.
///
/// Implementations keep exactly one cell per (form, row, column); a write to
/// an existing key replaces its data.
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// Loads every record as one immutable snapshot.
    async fn load_snapshot(&self) -> AppResult<FormSnapshot>;

    /// Inserts or replaces one cell and returns the stored record.
    async fn save_cell(&self, write: CellWrite) -> AppResult<Cell>;

    /// Lists selectable forms.
    async fn list_forms(&self) -> AppResult<Vec<Form>>;
}
