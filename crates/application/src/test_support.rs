use async_trait::async_trait;
use formloom_core::{AppResult, CellId};
use formloom_domain::{Cell, Form, FormSnapshot};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::form_ports::{CellWrite, FormRepository};

pub(crate) struct FakeFormRepository {
    snapshot: Mutex<FormSnapshot>,
}

impl FakeFormRepository {
    pub(crate) fn new(snapshot: Value) -> Self {
        Self {
            snapshot: Mutex::new(serde_json::from_value(snapshot).unwrap_or_else(|_| unreachable!())),
        }
    }

    pub(crate) async fn cells(&self) -> Vec<Cell> {
        self.snapshot.lock().await.cells.clone()
    }
}

#[async_trait]
impl FormRepository for FakeFormRepository {
    async fn load_snapshot(&self) -> AppResult<FormSnapshot> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save_cell(&self, write: CellWrite) -> AppResult<Cell> {
        let mut snapshot = self.snapshot.lock().await;
        let existing = snapshot.cells.iter().position(|cell| {
            cell.form_id() == &write.form_id
                && cell.row_id() == write.row_id.as_ref()
                && cell.column_id() == &write.column_id
        });

        let id = match existing {
            Some(position) => snapshot.cells.remove(position).id().clone(),
            None => CellId::generate(),
        };
        let cell = Cell::new(id, write.column_id, write.row_id, write.form_id, write.data);
        snapshot.cells.push(cell.clone());
        Ok(cell)
    }

    async fn list_forms(&self) -> AppResult<Vec<Form>> {
        Ok(self.snapshot.lock().await.forms())
    }
}
