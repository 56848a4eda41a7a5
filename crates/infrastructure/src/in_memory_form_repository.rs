use async_trait::async_trait;
use chrono::Utc;
use formloom_application::{CellWrite, FormRepository};
use formloom_core::{AppError, AppResult, CellId};
use formloom_domain::{Cell, Form, FormSnapshot};
use tokio::sync::RwLock;

/// In-memory form repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryFormRepository {
    snapshot: RwLock<FormSnapshot>,
}

impl InMemoryFormRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with the given records.
    #[must_use]
    pub fn with_snapshot(snapshot: FormSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Creates a repository seeded from a JSON snapshot document.
    pub fn from_json(document: &str) -> AppResult<Self> {
        let snapshot = serde_json::from_str::<FormSnapshot>(document).map_err(|error| {
            AppError::Validation(format!("invalid form snapshot document: {error}"))
        })?;

        Ok(Self::with_snapshot(snapshot))
    }
}

#[async_trait]
impl FormRepository for InMemoryFormRepository {
    async fn load_snapshot(&self) -> AppResult<FormSnapshot> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save_cell(&self, write: CellWrite) -> AppResult<Cell> {
        let mut snapshot = self.snapshot.write().await;
        let existing = snapshot.cells.iter().position(|cell| {
            cell.form_id() == &write.form_id
                && cell.row_id() == write.row_id.as_ref()
                && cell.column_id() == &write.column_id
        });

        let id = match existing {
            Some(position) => snapshot.cells.remove(position).id().clone(),
            None => CellId::generate(),
        };
        let cell = Cell::new(id, write.column_id, write.row_id, write.form_id, write.data)
            .with_updated_at(Some(Utc::now()));
        snapshot.cells.push(cell.clone());

        Ok(cell)
    }

    async fn list_forms(&self) -> AppResult<Vec<Form>> {
        Ok(self.snapshot.read().await.forms())
    }
}

#[cfg(test)]
mod tests {
    use formloom_application::{CellWrite, FormRepository};
    use formloom_core::{ColumnId, FormId, RowId};

    use super::InMemoryFormRepository;

    fn write(row: Option<&str>, data: &str) -> CellWrite {
        CellWrite {
            form_id: FormId::new("inspection").unwrap_or_else(|_| unreachable!()),
            row_id: row.map(|row| RowId::new(row).unwrap_or_else(|_| unreachable!())),
            column_id: ColumnId::new("voltage").unwrap_or_else(|_| unreachable!()),
            data: data.to_owned(),
        }
    }

    #[tokio::test]
    async fn save_cell_upserts_on_natural_key() {
        let repository = InMemoryFormRepository::new();

        let first = repository
            .save_cell(write(Some("cpu-424"), "230"))
            .await
            .unwrap_or_else(|_| unreachable!());
        let second = repository
            .save_cell(write(Some("cpu-424"), "231"))
            .await
            .unwrap_or_else(|_| unreachable!());
        repository
            .save_cell(write(None, "229"))
            .await
            .unwrap_or_else(|_| unreachable!());

        let snapshot = repository
            .load_snapshot()
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(first.id(), second.id());
        assert_eq!(snapshot.cells.len(), 2);
        assert!(second.updated_at().is_some());
    }

    #[tokio::test]
    async fn seeded_forms_are_listed() {
        let repository = InMemoryFormRepository::from_json(
            r#"{ "layouts": [{ "id": "inspection", "name": "Inspection", "type": "tab" }] }"#,
        )
        .unwrap_or_else(|_| unreachable!());

        let forms = repository
            .list_forms()
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id().as_str(), "inspection");
        assert!(InMemoryFormRepository::from_json("[]").is_err());
    }
}
