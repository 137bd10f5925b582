use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockdesk_core::{
    Coerced, Direction, Item, SheetName, SheetStore, StockMovement, StoreError, coerce_items,
    coerce_movements,
};
use tracing::{info, warn};

const APPEND_DATE_FORMAT: &str = "%d %b %Y";

/// A ledger row entered through the stock-in or stock-out form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMovement {
    pub direction: Direction,
    pub item_id: String,
    pub product_name: String,
    pub quantity: Decimal,
    pub date: NaiveDate,
    pub unit: String,
    pub unit_cost: String,
    pub remarks: String,
    pub distributed_to: String,
}

impl NewMovement {
    /// Cells keyed by the column names each ledger sheet uses.
    fn cells(&self) -> HashMap<&'static str, String> {
        let date = self.date.format(APPEND_DATE_FORMAT).to_string();
        let quantity = self.quantity.normalize().to_string();
        match self.direction {
            Direction::In => HashMap::from([
                ("RM ID", self.item_id.clone()),
                ("Product Name", self.product_name.clone()),
                ("Unit", self.unit.clone()),
                ("Quantity", quantity),
                ("Cost per Unit", self.unit_cost.clone()),
                ("Date", date),
            ]),
            Direction::Out => HashMap::from([
                ("Product ID", self.item_id.clone()),
                ("Product Name", self.product_name.clone()),
                ("Quantity Out", quantity),
                ("Remarks", self.remarks.clone()),
                ("Distributed To", self.distributed_to.clone()),
                ("Date", date),
            ]),
        }
    }
}

/// Typed access to the item master and the two ledgers.
#[derive(Clone)]
pub struct LedgerClient {
    store: Arc<dyn SheetStore>,
}

impl LedgerClient {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        Self { store }
    }

    pub async fn fetch_items(&self) -> Result<Coerced<Item>, StoreError> {
        let records = self.store.records(SheetName::ItemMaster).await?;
        Ok(coerce_items(&records))
    }

    pub async fn fetch_stock_in(&self) -> Result<Coerced<StockMovement>, StoreError> {
        let records = self.store.records(SheetName::StockIn).await?;
        Ok(coerce_movements(&records, Direction::In))
    }

    pub async fn fetch_stock_out(&self) -> Result<Coerced<StockMovement>, StoreError> {
        let records = self.store.records(SheetName::StockOut).await?;
        Ok(coerce_movements(&records, Direction::Out))
    }

    /// Appends the movement laid out in the target sheet's header order.
    /// Columns the form does not fill are written blank.
    pub async fn append_stock_movement(&self, movement: &NewMovement) -> Result<(), StoreError> {
        let sheet = SheetName::for_direction(movement.direction);
        let headers = self.store.headers(sheet).await?;
        if headers.is_empty() {
            warn!(%sheet, "refusing to append to a sheet without headers");
            return Err(StoreError::MissingHeaders(sheet));
        }

        let cells = movement.cells();
        let values: Vec<String> = headers
            .iter()
            .map(|header| cells.get(header.trim()).cloned().unwrap_or_default())
            .collect();

        self.store.append_row(sheet, values).await?;
        info!(
            %sheet,
            direction = movement.direction.as_str(),
            item_id = %movement.item_id,
            quantity = %movement.quantity,
            "stock movement appended"
        );
        Ok(())
    }
}
