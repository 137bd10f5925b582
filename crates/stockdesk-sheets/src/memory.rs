use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use stockdesk_core::{SheetName, SheetRecord, SheetStore, StoreError};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Sheet store held entirely in memory. Used by tests and when the board runs
/// without a database.
#[derive(Default)]
pub struct InMemorySheetStore {
    sheets: RwLock<HashMap<SheetName, Sheet>>,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a sheet's header row and contents.
    pub async fn load_sheet(&self, sheet: SheetName, headers: &[&str], rows: Vec<Vec<Value>>) {
        let mut sheets = self.sheets.write().await;
        sheets.insert(
            sheet,
            Sheet {
                headers: headers.iter().map(|header| header.to_string()).collect(),
                rows,
            },
        );
    }

    /// Every sheet with its default header row and no data rows.
    pub async fn with_default_headers() -> Self {
        let store = Self::new();
        for sheet in SheetName::ALL {
            store
                .load_sheet(sheet, sheet.default_headers(), Vec::new())
                .await;
        }
        store
    }

    pub async fn row_count(&self, sheet: SheetName) -> usize {
        let sheets = self.sheets.read().await;
        sheets.get(&sheet).map_or(0, |sheet| sheet.rows.len())
    }
}

#[async_trait]
impl SheetStore for InMemorySheetStore {
    async fn headers(&self, sheet: SheetName) -> Result<Vec<String>, StoreError> {
        let sheets = self.sheets.read().await;
        Ok(sheets
            .get(&sheet)
            .map(|sheet| sheet.headers.clone())
            .unwrap_or_default())
    }

    async fn records(&self, sheet: SheetName) -> Result<Vec<SheetRecord>, StoreError> {
        let sheets = self.sheets.read().await;
        let Some(sheet) = sheets.get(&sheet) else {
            return Ok(Vec::new());
        };

        Ok(sheet
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let cells = sheet
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().chain(std::iter::repeat(Value::Null)));
                SheetRecord::new(index + 2, cells)
            })
            .collect())
    }

    async fn append_row(&self, sheet: SheetName, values: Vec<String>) -> Result<(), StoreError> {
        let mut sheets = self.sheets.write().await;
        let target = sheets
            .get_mut(&sheet)
            .filter(|target| !target.headers.is_empty())
            .ok_or(StoreError::MissingHeaders(sheet))?;

        if values.len() > target.headers.len() {
            return Err(StoreError::Rejected {
                sheet,
                reason: format!(
                    "{} values for {} columns",
                    values.len(),
                    target.headers.len()
                ),
            });
        }

        target
            .rows
            .push(values.into_iter().map(Value::String).collect());
        Ok(())
    }
}
