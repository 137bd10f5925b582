//! Raw sheet rows and their coercion into typed ledger records.
//!
//! Everything that reaches the aggregator has passed through here. Rows that
//! cannot be coerced are returned as [`RowIssue`]s next to the good rows so one
//! bad cell never hides the rest of a sheet.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    diagnostics::RowIssue,
    error::RowError,
    models::{Direction, Item, StockMovement},
};

const ITEM_ID_COLUMN: &str = "RM ID";
const PRODUCT_ID_COLUMN: &str = "Product ID";
const PRODUCT_NAME_COLUMN: &str = "Product Name";
const UNIT_COLUMN: &str = "Unit";
const SUPPLIER_COLUMN: &str = "Supplier";
const REORDER_LEVEL_COLUMN: &str = "Reorder Level";
const UNIT_COST_COLUMN: &str = "Cost per Unit";
const AVG_UNIT_COST_COLUMN: &str = "Avg. Cost per Unit";
const MANUAL_REORDER_COLUMNS: [&str; 2] = ["Manual Reorder", "Reorder Flag"];
const STOCK_IN_QUANTITY_COLUMNS: [&str; 2] = ["Quantity", "Quantity In"];
const STOCK_OUT_QUANTITY_COLUMNS: [&str; 1] = ["Quantity Out"];
const MOVEMENT_KEY_COLUMNS: [&str; 3] = [ITEM_ID_COLUMN, PRODUCT_ID_COLUMN, PRODUCT_NAME_COLUMN];
const DATE_COLUMN: &str = "Date";

const ITEM_MASTER_LAYOUT: [&str; 8] = [
    ITEM_ID_COLUMN,
    PRODUCT_NAME_COLUMN,
    UNIT_COLUMN,
    UNIT_COST_COLUMN,
    AVG_UNIT_COST_COLUMN,
    REORDER_LEVEL_COLUMN,
    MANUAL_REORDER_COLUMNS[0],
    SUPPLIER_COLUMN,
];
const STOCK_IN_LAYOUT: [&str; 6] = [
    DATE_COLUMN,
    ITEM_ID_COLUMN,
    PRODUCT_NAME_COLUMN,
    UNIT_COLUMN,
    STOCK_IN_QUANTITY_COLUMNS[0],
    UNIT_COST_COLUMN,
];
const STOCK_OUT_LAYOUT: [&str; 6] = [
    DATE_COLUMN,
    PRODUCT_ID_COLUMN,
    PRODUCT_NAME_COLUMN,
    STOCK_OUT_QUANTITY_COLUMNS[0],
    "Remarks",
    "Distributed To",
];

const DATE_FORMATS: [&str; 7] = [
    "%d %b %Y",
    "%d %B %Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SheetName {
    ItemMaster,
    StockIn,
    StockOut,
}

impl SheetName {
    pub const ALL: [SheetName; 3] = [
        SheetName::ItemMaster,
        SheetName::StockIn,
        SheetName::StockOut,
    ];

    /// Worksheet title as it appears in the spreadsheet.
    pub fn title(&self) -> &'static str {
        match self {
            SheetName::ItemMaster => "Raw Material Master",
            SheetName::StockIn => "Stock In",
            SheetName::StockOut => "Stock Out",
        }
    }

    /// Header row of a fresh workbook.
    pub fn default_headers(&self) -> &'static [&'static str] {
        match self {
            SheetName::ItemMaster => &ITEM_MASTER_LAYOUT,
            SheetName::StockIn => &STOCK_IN_LAYOUT,
            SheetName::StockOut => &STOCK_OUT_LAYOUT,
        }
    }

    pub fn for_direction(direction: Direction) -> Self {
        match direction {
            Direction::In => SheetName::StockIn,
            Direction::Out => SheetName::StockOut,
        }
    }
}

impl fmt::Display for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One data row of a sheet, keyed by header. `row` is the 1-based sheet row,
/// so the first data row is row 2.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SheetRecord {
    pub row: usize,
    pub cells: BTreeMap<String, Value>,
}

impl SheetRecord {
    pub fn new(row: usize, cells: impl IntoIterator<Item = (String, Value)>) -> Self {
        let cells = cells
            .into_iter()
            .map(|(header, value)| (header.trim().to_string(), value))
            .collect();
        Self { row, cells }
    }

    fn has_column(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Cell as trimmed text; blank cells read as `None`.
    fn text(&self, column: &str) -> Option<String> {
        match self.cells.get(column)? {
            Value::Null => None,
            Value::String(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            other => Some(other.to_string()),
        }
    }

    fn first_text(&self, columns: &[&str]) -> Option<String> {
        columns.iter().find_map(|column| self.text(column))
    }
}

/// Typed rows plus the rows that failed coercion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coerced<T> {
    pub rows: Vec<T>,
    pub issues: Vec<RowIssue>,
}

impl<T> Default for Coerced<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            issues: Vec::new(),
        }
    }
}

pub fn coerce_items(records: &[SheetRecord]) -> Coerced<Item> {
    // The master is keyed by RM ID when the sheet has that column at all.
    let key_column = if records.iter().any(|record| record.has_column(ITEM_ID_COLUMN)) {
        ITEM_ID_COLUMN
    } else {
        PRODUCT_NAME_COLUMN
    };

    let mut coerced = Coerced::default();
    for record in records {
        let item_id = record.text(key_column);
        match coerce_item(record, key_column) {
            Ok(item) => coerced.rows.push(item),
            Err(error) => {
                debug!(
                    sheet = %SheetName::ItemMaster,
                    row = record.row,
                    %error,
                    "diverting item row"
                );
                coerced.issues.push(RowIssue {
                    sheet: SheetName::ItemMaster,
                    row: record.row,
                    item_id,
                    error,
                });
            }
        }
    }
    coerced
}

fn coerce_item(record: &SheetRecord, key_column: &str) -> Result<Item, RowError> {
    let id = record.text(key_column).ok_or_else(|| RowError::Missing {
        field: key_column.to_string(),
    })?;
    let name = record.text(PRODUCT_NAME_COLUMN).unwrap_or_else(|| id.clone());

    let reorder_level = money_cell(record, REORDER_LEVEL_COLUMN)?.unwrap_or_default();
    let cost = money_cell(record, UNIT_COST_COLUMN)?.unwrap_or_default();
    let unit_cost = if cost.is_zero() {
        money_cell(record, AVG_UNIT_COST_COLUMN)?.unwrap_or_default()
    } else {
        cost
    };

    let manual_reorder = MANUAL_REORDER_COLUMNS
        .iter()
        .any(|column| record.cells.get(*column).is_some_and(is_truthy));

    Ok(Item {
        row: record.row,
        id,
        name,
        unit: record.text(UNIT_COLUMN),
        reorder_level,
        unit_cost,
        manual_reorder,
        supplier: record.text(SUPPLIER_COLUMN),
    })
}

pub fn coerce_movements(records: &[SheetRecord], direction: Direction) -> Coerced<StockMovement> {
    let sheet = SheetName::for_direction(direction);
    let quantity_columns: &[&str] = match direction {
        Direction::In => &STOCK_IN_QUANTITY_COLUMNS,
        Direction::Out => &STOCK_OUT_QUANTITY_COLUMNS,
    };

    let mut coerced = Coerced::default();
    for record in records {
        let item_id = record.first_text(&MOVEMENT_KEY_COLUMNS);
        match coerce_movement(record, item_id.clone(), quantity_columns, direction) {
            Ok(movement) => coerced.rows.push(movement),
            Err(error) => {
                debug!(%sheet, row = record.row, %error, "diverting movement row");
                coerced.issues.push(RowIssue {
                    sheet,
                    row: record.row,
                    item_id,
                    error,
                });
            }
        }
    }
    coerced
}

fn coerce_movement(
    record: &SheetRecord,
    item_id: Option<String>,
    quantity_columns: &[&str],
    direction: Direction,
) -> Result<StockMovement, RowError> {
    let item_id = item_id.ok_or_else(|| RowError::Missing {
        field: MOVEMENT_KEY_COLUMNS.join(" / "),
    })?;

    let (column, raw) = quantity_columns
        .iter()
        .find_map(|column| record.text(column).map(|raw| (*column, raw)))
        .ok_or_else(|| RowError::Missing {
            field: quantity_columns[0].to_string(),
        })?;
    let quantity = parse_quantity(column, &raw)?;

    Ok(StockMovement {
        row: record.row,
        item_id,
        quantity,
        direction,
        occurred_on: record.text(DATE_COLUMN).and_then(|raw| parse_date(&raw)),
    })
}

/// Numeric cells are taken as they are; only text cells go through the
/// currency cleanup of [`parse_money`].
fn money_cell(record: &SheetRecord, column: &str) -> Result<Option<Decimal>, RowError> {
    match record.cells.get(column) {
        Some(Value::Number(number)) => {
            let raw = number.to_string();
            let value = parse_decimal(&raw).ok_or_else(|| RowError::NotANumber {
                field: column.to_string(),
                raw: raw.clone(),
            })?;
            non_negative(column, &raw, value).map(Some)
        }
        _ => record
            .text(column)
            .map(|raw| parse_money(column, &raw))
            .transpose(),
    }
}

/// Quantities are plain numbers; only thousands separators are tolerated.
pub fn parse_quantity(field: &str, raw: &str) -> Result<Decimal, RowError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let value = parse_decimal(&cleaned).ok_or_else(|| RowError::NotANumber {
        field: field.to_string(),
        raw: raw.to_string(),
    })?;
    non_negative(field, raw, value)
}

/// Money cells carry currency symbols and separators (`₹1,650`); anything that
/// is not a digit, point or minus sign is dropped before parsing.
pub fn parse_money(field: &str, raw: &str) -> Result<Decimal, RowError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let value = parse_decimal(&cleaned).ok_or_else(|| RowError::NotANumber {
        field: field.to_string(),
        raw: raw.to_string(),
    })?;
    non_negative(field, raw, value)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn non_negative(field: &str, raw: &str, value: Decimal) -> Result<Decimal, RowError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(RowError::Negative {
            field: field.to_string(),
            raw: raw.to_string(),
        });
    }
    Ok(value)
}

/// Day-first date parsing. Unparseable dates are dropped, not reported.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "yes" | "y" | "true" | "1" | "x"
        ),
        _ => false,
    }
}
