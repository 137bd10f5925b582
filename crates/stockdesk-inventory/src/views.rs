//! Read-only projections over a computed ledger for charts and tables.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockdesk_core::{DerivedItemState, Direction, StockMovement};

pub const DEFAULT_TOP_N: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyFlow {
    pub date: NaiveDate,
    pub stock_in: Decimal,
    pub stock_out: Decimal,
}

/// Per-date stock-in and stock-out totals, oldest first. Undated rows are
/// skipped; a date seen on only one side reports zero for the other. Totals
/// saturate at the decimal range.
pub fn daily_flow<'a>(movements: impl IntoIterator<Item = &'a StockMovement>) -> Vec<DailyFlow> {
    let mut by_date: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for movement in movements {
        let Some(date) = movement.occurred_on else {
            continue;
        };
        let entry = by_date.entry(date).or_default();
        let side = match movement.direction {
            Direction::In => &mut entry.0,
            Direction::Out => &mut entry.1,
        };
        *side = side.saturating_add(movement.quantity);
    }

    by_date
        .into_iter()
        .map(|(date, (stock_in, stock_out))| DailyFlow {
            date,
            stock_in,
            stock_out,
        })
        .collect()
}

/// The `n` items holding the most stock. Ties keep item-master order.
pub fn top_by_stock(states: &[DerivedItemState], n: usize) -> Vec<DerivedItemState> {
    let mut ranked: Vec<&DerivedItemState> = states.iter().collect();
    ranked.sort_by(|a, b| b.current_stock.cmp(&a.current_stock));
    ranked.into_iter().take(n).cloned().collect()
}

/// Case-insensitive substring match on item id or name. A blank query matches
/// everything.
pub fn search(states: &[DerivedItemState], query: &str) -> Vec<DerivedItemState> {
    let needle = query.trim().to_lowercase();
    states
        .iter()
        .filter(|state| {
            needle.is_empty()
                || state.item_id.to_lowercase().contains(&needle)
                || state.name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Items with an alert, most severe first.
pub fn alerts(states: &[DerivedItemState]) -> Vec<DerivedItemState> {
    let mut flagged: Vec<DerivedItemState> = states
        .iter()
        .filter(|state| state.alert.is_alert())
        .cloned()
        .collect();
    flagged.sort_by(|a, b| b.alert.cmp(&a.alert));
    flagged
}
