use std::sync::Arc;

use formloom_core::{AppError, AppResult, ColumnId, FormId, LayoutId, RowId};
use formloom_domain::{Cell, Form, FormSnapshot};

use crate::engine::{FormAssembler, FormView};
use crate::form_ports::{CellWrite, FormRepository};

/// Required input that still lacks a usable value or names an unknown column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsatisfiedField {
    /// Input layout.
    pub layout_id: LayoutId,
    /// Bound column.
    pub column_id: ColumnId,
    /// Unique column name, `None` when the column does not exist.
    pub column_name: Option<String>,
}

/// Application service assembling form views and recording cell values.
#[derive(Clone)]
pub struct FormRuntimeService {
    repository: Arc<dyn FormRepository>,
}

impl FormRuntimeService {
    /// Creates a runtime service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn FormRepository>) -> Self {
        Self { repository }
    }

    /// Lists selectable forms.
    pub async fn list_forms(&self) -> AppResult<Vec<Form>> {
        self.repository.list_forms().await
    }

    /// Assembles one form for one row, or form-wide when `row_id` is `None`.
    pub async fn view(&self, form_id: &FormId, row_id: Option<&RowId>) -> AppResult<FormView> {
        let snapshot = self.repository.load_snapshot().await?;
        FormAssembler::new(&snapshot).assemble(form_id, row_id)
    }

    /// Assembles every row usable with a form.
    pub async fn row_views(&self, form_id: &FormId) -> AppResult<Vec<FormView>> {
        let snapshot = self.repository.load_snapshot().await?;
        let row_ids = snapshot
            .rows_for_form(form_id)
            .into_iter()
            .map(|row| row.id().clone())
            .collect::<Vec<_>>();

        let assembler = FormAssembler::new(&snapshot);
        if row_ids.is_empty() {
            assembler.assemble(form_id, None)?;
            return Ok(Vec::new());
        }

        assembler
            .assemble_rows(form_id, &row_ids)
            .into_iter()
            .collect()
    }

    /// Lists visible required inputs without a usable value.
    pub async fn unsatisfied_required(
        &self,
        form_id: &FormId,
        row_id: Option<&RowId>,
    ) -> AppResult<Vec<UnsatisfiedField>> {
        let view = self.view(form_id, row_id).await?;

        Ok(view
            .unsatisfied_required()
            .into_iter()
            .filter_map(|node| {
                let column_id = node.kind.column_id()?;
                Some(UnsatisfiedField {
                    layout_id: node.layout_id.clone(),
                    column_id: column_id.clone(),
                    column_name: node.column.as_ref().map(|column| column.name.clone()),
                })
            })
            .collect())
    }

    /// Validates and stores one cell value, replacing any previous value.
    pub async fn write_cell(&self, write: CellWrite) -> AppResult<Cell> {
        let snapshot = self.repository.load_snapshot().await?;
        Self::validate_write(&snapshot, &write)?;
        self.repository.save_cell(write).await
    }

    pub(crate) fn validate_write(snapshot: &FormSnapshot, write: &CellWrite) -> AppResult<()> {
        let form_layout = snapshot
            .layout(&LayoutId::from(&write.form_id))
            .ok_or_else(|| AppError::NotFound(format!("form '{}' does not exist", write.form_id)))?;
        if !form_layout.is_form() {
            return Err(AppError::Validation(format!(
                "layout '{}' is not a top-level form",
                write.form_id
            )));
        }

        if let Some(row_id) = &write.row_id {
            let row = snapshot
                .rows
                .iter()
                .find(|row| row.id() == row_id)
                .ok_or_else(|| AppError::NotFound(format!("row '{row_id}' does not exist")))?;
            if !row.belongs_to(&write.form_id) {
                return Err(AppError::Validation(format!(
                    "row '{row_id}' belongs to another form"
                )));
            }
        }

        let column = snapshot
            .columns
            .iter()
            .find(|column| column.id() == &write.column_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("column '{}' does not exist", write.column_id))
            })?;

        column.validate_data(write.data.as_str())
    }
}
