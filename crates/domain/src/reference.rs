use std::fmt;

use formloom_core::{AppError, AppResult};

/// Placeholder naming a column by its unique name, with an optional path into
/// a structured value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    column_name: String,
    path: Vec<String>,
}

impl Reference {
    /// Parses a bare `#name` or `#name#field.sub` token.
    ///
    /// The token must span the whole trimmed input and contain no whitespace.
    pub fn parse(token: &str) -> AppResult<Self> {
        Self::try_parse(token)
            .ok_or_else(|| AppError::Validation(format!("'{token}' is not a column reference")))
    }

    /// Parses a bare reference, returning `None` for literal text.
    #[must_use]
    pub fn try_parse(token: &str) -> Option<Self> {
        let body = token.trim().strip_prefix('#')?;
        if body.is_empty() || body.chars().any(char::is_whitespace) {
            return None;
        }

        let (column_name, field) = match body.split_once('#') {
            Some((name, field)) => (name, Some(field)),
            None => (body, None),
        };
        if column_name.is_empty() || column_name.contains(['{', '}']) {
            return None;
        }

        let path = match field {
            None => Vec::new(),
            Some(field) => {
                let segments = field.split('.').map(str::to_owned).collect::<Vec<_>>();
                if segments
                    .iter()
                    .any(|segment| segment.is_empty() || segment.contains(['#', '{', '}']))
                {
                    return None;
                }
                segments
            }
        };

        Some(Self {
            column_name: column_name.to_owned(),
            path,
        })
    }

    /// Returns the referenced column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        self.column_name.as_str()
    }

    /// Returns the field path, empty when the whole value is referenced.
    #[must_use]
    pub fn path(&self) -> &[String] {
        self.path.as_slice()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "#{}", self.column_name)?;
        if !self.path.is_empty() {
            write!(formatter, "#{}", self.path.join("."))?;
        }
        Ok(())
    }
}

/// One piece of an interpolated template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSegment<'a> {
    /// Text copied as-is.
    Literal(&'a str),
    /// `${...}` placeholder to substitute.
    Placeholder(Reference),
}

/// Splits a template into literal text and `${#name#field}` placeholders.
///
/// Unterminated or malformed placeholders stay literal text.
#[must_use]
pub fn parse_template(template: &str) -> Vec<TemplateSegment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find("${") {
        let open = cursor + offset;
        let Some(close_offset) = template[open + 2..].find('}') else {
            break;
        };
        let close = open + 2 + close_offset;

        match Reference::try_parse(&template[open + 2..close]) {
            Some(reference) => {
                if literal_start < open {
                    segments.push(TemplateSegment::Literal(&template[literal_start..open]));
                }
                segments.push(TemplateSegment::Placeholder(reference));
                literal_start = close + 1;
                cursor = close + 1;
            }
            None => cursor = open + 2,
        }
    }

    if literal_start < template.len() {
        segments.push(TemplateSegment::Literal(&template[literal_start..]));
    }

    segments
}
