use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockdesk_core::{
    AlertCategory, AlertCounts, Coerced, DerivedItemState, Diagnostic, Direction, Item,
    RowIssue, SheetName, StockMovement,
};

/// The three row-sets of one fetch, already coerced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerInput {
    pub items: Coerced<Item>,
    pub stock_in: Coerced<StockMovement>,
    pub stock_out: Coerced<StockMovement>,
}

impl LedgerInput {
    pub fn movements(&self) -> impl Iterator<Item = &StockMovement> {
        self.stock_in.rows.iter().chain(self.stock_out.rows.iter())
    }

    pub fn issues(&self) -> impl Iterator<Item = &RowIssue> {
        self.items
            .issues
            .iter()
            .chain(self.stock_in.issues.iter())
            .chain(self.stock_out.issues.iter())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerTotals {
    pub item_count: usize,
    pub total_stock: Decimal,
    /// Excludes items carrying a data-quality issue.
    pub total_value: Decimal,
    pub total_received: Decimal,
    pub total_issued: Decimal,
    pub alerts: AlertCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerState {
    pub items: Vec<DerivedItemState>,
    pub totals: LedgerTotals,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Default)]
struct Flow {
    received: Decimal,
    issued: Decimal,
    overflowed: bool,
}

fn overflow(diagnostics: &mut Vec<Diagnostic>, item_id: &str, field: &str) {
    diagnostics.push(Diagnostic::Overflow {
        item_id: item_id.to_string(),
        field: field.to_string(),
    });
}

/// Adds `value` into `total`, leaving `total` untouched when the sum would
/// leave the decimal range.
fn accumulate(total: &mut Decimal, value: Decimal) -> bool {
    match total.checked_add(value) {
        Some(sum) => {
            *total = sum;
            true
        }
        None => false,
    }
}

/// Derives per-item stock, value and alert category from one fetch.
///
/// Item states come out in item-master order. Movements for ids missing from
/// the master never touch any item and are reported as `UnknownItem`. Sums
/// that leave the decimal range flag the item instead of panicking.
pub fn compute_state(input: &LedgerInput) -> LedgerState {
    let mut diagnostics: Vec<Diagnostic> = input
        .issues()
        .cloned()
        .map(Diagnostic::MalformedRow)
        .collect();

    let mut items: Vec<&Item> = Vec::with_capacity(input.items.rows.len());
    let mut flows: HashMap<&str, Flow> = HashMap::with_capacity(input.items.rows.len());
    for item in &input.items.rows {
        if flows.contains_key(item.id.as_str()) {
            diagnostics.push(Diagnostic::DuplicateItem {
                row: item.row,
                item_id: item.id.clone(),
            });
            continue;
        }
        flows.insert(item.id.as_str(), Flow::default());
        items.push(item);
    }

    for movement in input.movements() {
        let Some(flow) = flows.get_mut(movement.item_id.as_str()) else {
            diagnostics.push(Diagnostic::UnknownItem {
                sheet: SheetName::for_direction(movement.direction),
                row: movement.row,
                item_id: movement.item_id.clone(),
            });
            continue;
        };
        let (total, field) = match movement.direction {
            Direction::In => (&mut flow.received, "received"),
            Direction::Out => (&mut flow.issued, "issued"),
        };
        if !accumulate(total, movement.quantity) {
            flow.overflowed = true;
            overflow(&mut diagnostics, &movement.item_id, field);
        }
    }

    let flagged: HashSet<&str> = input
        .stock_in
        .issues
        .iter()
        .chain(input.stock_out.issues.iter())
        .filter_map(|issue| issue.item_id.as_deref())
        .collect();

    let mut totals = LedgerTotals::default();
    let mut states: Vec<DerivedItemState> = Vec::with_capacity(items.len());
    for item in items {
        let flow = &flows[item.id.as_str()];
        let mut overflowed = flow.overflowed;

        let current_stock = flow.received.checked_sub(flow.issued).unwrap_or_else(|| {
            overflowed = true;
            overflow(&mut diagnostics, &item.id, "current_stock");
            Decimal::ZERO
        });
        let current_value = current_stock.checked_mul(item.unit_cost).unwrap_or_else(|| {
            overflowed = true;
            overflow(&mut diagnostics, &item.id, "current_value");
            Decimal::ZERO
        });
        let alert = AlertCategory::classify(current_stock, item.reorder_level, item.manual_reorder);

        totals.item_count += 1;
        totals.alerts.add(alert);
        for (total, value, field) in [
            (&mut totals.total_stock, current_stock, "total_stock"),
            (&mut totals.total_received, flow.received, "total_received"),
            (&mut totals.total_issued, flow.issued, "total_issued"),
        ] {
            if !accumulate(total, value) {
                overflowed = true;
                overflow(&mut diagnostics, &item.id, field);
            }
        }

        let mut data_quality_issue = overflowed || flagged.contains(item.id.as_str());
        if !data_quality_issue && !accumulate(&mut totals.total_value, current_value) {
            data_quality_issue = true;
            overflow(&mut diagnostics, &item.id, "total_value");
        }

        states.push(DerivedItemState {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit: item.unit.clone(),
            received: flow.received,
            issued: flow.issued,
            current_stock,
            unit_cost: item.unit_cost,
            current_value,
            reorder_level: item.reorder_level,
            alert,
            data_quality_issue,
        });
    }

    LedgerState {
        items: states,
        totals,
        diagnostics,
    }
}
