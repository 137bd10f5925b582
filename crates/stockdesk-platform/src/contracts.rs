use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockdesk_core::{AlertSnapshot, DerivedItemState, Diagnostic, Direction, StockMovement};
use stockdesk_inventory::{DailyFlow, LedgerTotals};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockInForm {
    #[serde(default)]
    pub rm_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub unit: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub cost_per_unit: String,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOutForm {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub quantity_out: Decimal,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub distributed_to: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMovementResponse {
    pub direction: Direction,
    pub item_id: String,
    pub quantity: Decimal,
    pub date: NaiveDate,
    pub appended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    /// True when the store could not be read and older (or no) data is shown.
    pub stale: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    pub totals: LedgerTotals,
    pub alerts: Vec<DerivedItemState>,
    pub top_stock: Vec<DerivedItemState>,
    pub daily_flow: Vec<DailyFlow>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockTableQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTableResponse {
    pub stale: bool,
    pub items: Vec<DerivedItemState>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementsResponse {
    pub stale: bool,
    pub stock_in: Vec<StockMovement>,
    pub stock_out: Vec<StockMovement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResponse {
    pub session_id: String,
    pub snapshots: Vec<AlertSnapshot>,
}
