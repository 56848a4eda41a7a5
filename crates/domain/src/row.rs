use formloom_core::{FormId, RowId};
use serde::{Deserialize, Serialize};

/// Repeatable data context filled independently with the same columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    id: RowId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "FormId")]
    form_id: Option<FormId>,
}

impl Row {
    /// Creates a row, global across forms when `form_id` is `None`.
    #[must_use]
    pub fn new(id: RowId, name: Option<String>, form_id: Option<FormId>) -> Self {
        Self { id, name, form_id }
    }

    /// Returns the row id.
    #[must_use]
    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// Returns the optional display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the owning form, `None` for global rows.
    #[must_use]
    pub fn form_id(&self) -> Option<&FormId> {
        self.form_id.as_ref()
    }

    /// Returns whether this row can be used with the given form.
    #[must_use]
    pub fn belongs_to(&self, form_id: &FormId) -> bool {
        self.form_id.as_ref().is_none_or(|owner| owner == form_id)
    }
}
