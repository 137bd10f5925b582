use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::SheetName;

/// Failures reported by a sheet store.
///
/// `Unavailable` is the transient case: callers treat it as "no data this
/// refresh" and decide on their own whether to retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("sheet store unavailable: {0}")]
    Unavailable(String),
    #[error("sheet `{0}` has no header row")]
    MissingHeaders(SheetName),
    #[error("row rejected by sheet `{sheet}`: {reason}")]
    Rejected { sheet: SheetName, reason: String },
}

/// Why a single sheet row could not be coerced into a typed record.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RowError {
    #[error("missing value for `{field}`")]
    Missing { field: String },
    #[error("`{field}` is not a number: {raw:?}")]
    NotANumber { field: String, raw: String },
    #[error("`{field}` must not be negative: {raw}")]
    Negative { field: String, raw: String },
}
