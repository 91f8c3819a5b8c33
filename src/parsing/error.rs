//! Typed errors for HTML extraction.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("expected structure not found: {what}")]
    StructureNotFound {
        what: String,
        tried_selectors: Vec<String>,
    },

    #[error("required field '{field}' not found")]
    RequiredFieldMissing {
        field: String,
        context: Option<String>,
    },

    #[error("row {index} rejected: {reason}")]
    RowRejected { index: usize, reason: String },

    #[error("URL resolution failed for '{url}': {reason}")]
    UrlResolutionFailed { url: String, reason: String },
}

impl ParseError {
    /// Structure-level failure: the container/table/header the parser relies
    /// on is absent. The whole scrape yields an empty result in this case.
    pub fn structure_not_found(what: &str, tried_selectors: Vec<String>) -> Self {
        Self::StructureNotFound {
            what: what.to_string(),
            tried_selectors,
        }
    }

    pub fn required_field_missing(field: &str, context: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            context: context.map(|s| s.to_string()),
        }
    }

    pub fn row_rejected(index: usize, reason: impl Into<String>) -> Self {
        Self::RowRejected {
            index,
            reason: reason.into(),
        }
    }

    /// Whether processing may continue with the remaining rows/links after
    /// this error. Only structure-level discovery failures end a scrape.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::StructureNotFound { .. })
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
