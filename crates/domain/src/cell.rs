use std::borrow::Cow;

use chrono::{DateTime, Utc};
use formloom_core::{AppError, AppResult, CellId, ColumnId, FormId, RowId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Returns the comparable text of stored cell data.
///
/// Data holding a JSON-encoded string yields the decoded string; anything else
/// is returned verbatim.
#[must_use]
pub fn decoded_text(data: &str) -> Cow<'_, str> {
    let trimmed = data.trim_start();
    if trimmed.starts_with('"')
        && let Ok(Value::String(text)) = serde_json::from_str::<Value>(data)
    {
        return Cow::Owned(text);
    }

    Cow::Borrowed(data)
}

/// Stored value of one column for one row, or form-wide when the row is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CellRecord", into = "CellRecord")]
pub struct Cell {
    id: CellId,
    column_id: ColumnId,
    row_id: Option<RowId>,
    form_id: FormId,
    data: String,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellRecord {
    id: CellId,
    #[serde(alias = "ColumnId")]
    column_id: ColumnId,
    #[serde(default, alias = "RowId")]
    row_id: Option<RowId>,
    #[serde(alias = "FormId")]
    form_id: FormId,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<CellRecord> for Cell {
    type Error = AppError;

    fn try_from(record: CellRecord) -> Result<Self, Self::Error> {
        let data = match record.data {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };

        Ok(Self::new(
            record.id,
            record.column_id,
            record.row_id,
            record.form_id,
            data,
        )
        .with_updated_at(record.updated_at))
    }
}

impl From<Cell> for CellRecord {
    fn from(cell: Cell) -> Self {
        Self {
            id: cell.id,
            column_id: cell.column_id,
            row_id: cell.row_id,
            form_id: cell.form_id,
            data: Value::String(cell.data),
            updated_at: cell.updated_at,
        }
    }
}

impl Cell {
    /// Creates a cell.
    #[must_use]
    pub fn new(
        id: CellId,
        column_id: ColumnId,
        row_id: Option<RowId>,
        form_id: FormId,
        data: impl Into<String>,
    ) -> Self {
        Self {
            id,
            column_id,
            row_id,
            form_id,
            data: data.into(),
            updated_at: None,
        }
    }

    /// Returns a copy stamped with the last write time.
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: Option<DateTime<Utc>>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Returns the cell id.
    #[must_use]
    pub fn id(&self) -> &CellId {
        &self.id
    }

    /// Returns the column this value belongs to.
    #[must_use]
    pub fn column_id(&self) -> &ColumnId {
        &self.column_id
    }

    /// Returns the row, `None` for form-wide values.
    #[must_use]
    pub fn row_id(&self) -> Option<&RowId> {
        self.row_id.as_ref()
    }

    /// Returns the owning form.
    #[must_use]
    pub fn form_id(&self) -> &FormId {
        &self.form_id
    }

    /// Returns the raw stored data.
    #[must_use]
    pub fn data(&self) -> &str {
        self.data.as_str()
    }

    /// Returns the last write time when known.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Parses the data as an api column payload.
    pub fn api_data(&self) -> AppResult<ApiCellData> {
        ApiCellData::parse(self.data.as_str())
    }
}

/// Stored request and response of an api column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiCellData {
    /// Last request payload.
    #[serde(default)]
    pub request: Option<Value>,
    /// Last validated response body.
    #[serde(default)]
    pub response: Option<Value>,
}

impl ApiCellData {
    /// Parses stored api cell data; blank data is an empty payload.
    pub fn parse(data: &str) -> AppResult<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(data).map_err(|error| {
            AppError::Validation(format!("api cell data must be a JSON object: {error}"))
        })
    }

    /// Returns whether a non-null response has been stored.
    #[must_use]
    pub fn has_response(&self) -> bool {
        self.response.as_ref().is_some_and(|response| !response.is_null())
    }

    /// Serializes the payload into stored cell data.
    #[must_use]
    pub fn to_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned())
    }
}
