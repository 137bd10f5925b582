use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A row of the item master.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub row: usize,
    pub id: String,
    pub name: String,
    pub unit: Option<String>,
    pub reorder_level: Decimal,
    pub unit_cost: Decimal,
    pub manual_reorder: bool,
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }
}

/// A stock-in or stock-out ledger row. The quantity is always non-negative;
/// its sign comes from `direction`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockMovement {
    pub row: usize,
    pub item_id: String,
    pub quantity: Decimal,
    pub direction: Direction,
    pub occurred_on: Option<NaiveDate>,
}

/// Severity is ordered: `None < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCategory {
    None,
    Medium,
    High,
    Critical,
}

impl AlertCategory {
    /// First match wins: empty stock outranks the manual flag, which outranks
    /// the reorder-level comparison.
    pub fn classify(current_stock: Decimal, reorder_level: Decimal, manual_reorder: bool) -> Self {
        if current_stock <= Decimal::ZERO {
            AlertCategory::Critical
        } else if manual_reorder {
            AlertCategory::High
        } else if current_stock < reorder_level {
            AlertCategory::Medium
        } else {
            AlertCategory::None
        }
    }

    pub fn is_alert(&self) -> bool {
        *self != AlertCategory::None
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
}

impl AlertCounts {
    pub fn add(&mut self, category: AlertCategory) {
        match category {
            AlertCategory::Critical => self.critical += 1,
            AlertCategory::High => self.high += 1,
            AlertCategory::Medium => self.medium += 1,
            AlertCategory::None => {}
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DerivedItemState {
    pub item_id: String,
    pub name: String,
    pub unit: Option<String>,
    pub received: Decimal,
    pub issued: Decimal,
    pub current_stock: Decimal,
    pub unit_cost: Decimal,
    pub current_value: Decimal,
    pub reorder_level: Decimal,
    pub alert: AlertCategory,
    /// Set when at least one of the item's ledger rows was diverted to
    /// diagnostics; its value is then left out of the inventory total.
    pub data_quality_issue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertSnapshot {
    pub recorded_at: DateTime<Utc>,
    pub counts: AlertCounts,
}
