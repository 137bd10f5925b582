pub mod diagnostics;
pub mod error;
pub mod models;
pub mod records;
pub mod storage;

pub use diagnostics::{Diagnostic, RowIssue};
pub use error::{RowError, StoreError};
pub use models::{
    AlertCategory, AlertCounts, AlertSnapshot, DerivedItemState, Direction, Item, StockMovement,
};
pub use records::{Coerced, SheetName, SheetRecord, coerce_items, coerce_movements};
pub use storage::SheetStore;
