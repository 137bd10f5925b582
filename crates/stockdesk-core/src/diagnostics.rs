use serde::{Deserialize, Serialize};

use crate::{error::RowError, records::SheetName};

/// A sheet row diverted at the fetch boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowIssue {
    pub sheet: SheetName,
    pub row: usize,
    pub item_id: Option<String>,
    pub error: RowError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    MalformedRow(RowIssue),
    UnknownItem {
        sheet: SheetName,
        row: usize,
        item_id: String,
    },
    DuplicateItem {
        row: usize,
        item_id: String,
    },
    /// A per-item figure left the decimal range. The item is flagged and the
    /// figure that overflowed is left out.
    Overflow {
        item_id: String,
        field: String,
    },
}

impl Diagnostic {
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Diagnostic::MalformedRow(issue) => issue.item_id.as_deref(),
            Diagnostic::UnknownItem { item_id, .. }
            | Diagnostic::DuplicateItem { item_id, .. }
            | Diagnostic::Overflow { item_id, .. } => Some(item_id),
        }
    }
}
