use async_trait::async_trait;

use crate::{
    error::StoreError,
    records::{SheetName, SheetRecord},
};

/// The remote spreadsheet holding the item master and both ledgers.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Header row of a sheet, in column order.
    async fn headers(&self, sheet: SheetName) -> Result<Vec<String>, StoreError>;

    /// All data rows of a sheet, keyed by header.
    async fn records(&self, sheet: SheetName) -> Result<Vec<SheetRecord>, StoreError>;

    /// Appends one row whose cells follow the order of [`SheetStore::headers`].
    async fn append_row(&self, sheet: SheetName, values: Vec<String>) -> Result<(), StoreError>;
}
