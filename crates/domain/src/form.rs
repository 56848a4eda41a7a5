use formloom_core::FormId;
use serde::{Deserialize, Serialize};

/// Selectable form, identified by the id of its top-level layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    id: FormId,
    #[serde(default)]
    name: Option<String>,
}

impl Form {
    /// Creates a form descriptor.
    #[must_use]
    pub fn new(id: FormId, name: Option<String>) -> Self {
        Self { id, name }
    }

    /// Returns the form id.
    #[must_use]
    pub fn id(&self) -> &FormId {
        &self.id
    }

    /// Returns the optional display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
