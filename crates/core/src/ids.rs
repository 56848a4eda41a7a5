use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, AppResult};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a validated ", $label, " identifier.")]
            pub fn new(value: impl Into<String>) -> AppResult<Self> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(AppError::Validation(format!(
                        "{} id must not be empty",
                        $label
                    )));
                }

                if trimmed.len() == value.len() {
                    Ok(Self(value))
                } else {
                    Ok(Self(trimmed.to_owned()))
                }
            }

            #[doc = concat!("Creates a random ", $label, " identifier.")]
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Returns the underlying string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                formatter.write_str(self.0.as_str())
            }
        }
    };
}

record_id!(
    /// Identifier of a reusable field definition.
    ColumnId,
    "column"
);
record_id!(
    /// Identifier of a presentation tree node.
    LayoutId,
    "layout"
);
record_id!(
    /// Identifier of a conditional rule node.
    ConditionId,
    "condition"
);
record_id!(
    /// Identifier of a repeatable data context.
    RowId,
    "row"
);
record_id!(
    /// Identifier of a stored field value.
    CellId,
    "cell"
);
record_id!(
    /// Identifier of a form, equal to the id of its top-level layout.
    FormId,
    "form"
);

impl From<&LayoutId> for FormId {
    fn from(value: &LayoutId) -> Self {
        Self(value.as_str().to_owned())
    }
}

impl From<&FormId> for LayoutId {
    fn from(value: &FormId) -> Self {
        Self(value.as_str().to_owned())
    }
}
