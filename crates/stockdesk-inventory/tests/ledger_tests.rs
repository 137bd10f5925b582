//! Ledger aggregation tests
//!
//! Stock derivation, alert precedence, data-quality isolation and the purity
//! of `compute_state`.

use std::str::FromStr;

use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;
use stockdesk_core::{
    AlertCategory, Coerced, Diagnostic, Direction, Item, RowError, SheetRecord, StockMovement,
    coerce_items, coerce_movements,
};
use stockdesk_inventory::{LedgerInput, compute_state};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(id: &str, reorder_level: i64, unit_cost: &str, manual_reorder: bool) -> Item {
    Item {
        row: 2,
        id: id.to_string(),
        name: format!("{id} name"),
        unit: Some("kg".to_string()),
        reorder_level: Decimal::from(reorder_level),
        unit_cost: dec(unit_cost),
        manual_reorder,
        supplier: None,
    }
}

fn movement(id: &str, direction: Direction, quantity: i64) -> StockMovement {
    StockMovement {
        row: 2,
        item_id: id.to_string(),
        quantity: Decimal::from(quantity),
        direction,
        occurred_on: None,
    }
}

fn input(items: Vec<Item>, movements: Vec<StockMovement>) -> LedgerInput {
    let (stock_in, stock_out): (Vec<_>, Vec<_>) = movements
        .into_iter()
        .partition(|m| m.direction == Direction::In);
    LedgerInput {
        items: Coerced {
            rows: items,
            issues: Vec::new(),
        },
        stock_in: Coerced {
            rows: stock_in,
            issues: Vec::new(),
        },
        stock_out: Coerced {
            rows: stock_out,
            issues: Vec::new(),
        },
    }
}

fn alert_of(id: &str, items: Vec<Item>, movements: Vec<StockMovement>) -> AlertCategory {
    compute_state(&input(items, movements))
        .items
        .into_iter()
        .find(|state| state.item_id == id)
        .map(|state| state.alert)
        .unwrap()
}

#[test]
fn current_stock_is_received_minus_issued() {
    let state = compute_state(&input(
        vec![item("RM-001", 0, "2", false), item("RM-002", 0, "3", false)],
        vec![
            movement("RM-001", Direction::In, 50),
            movement("RM-001", Direction::In, 30),
            movement("RM-001", Direction::Out, 20),
            movement("RM-002", Direction::In, 7),
        ],
    ));

    let first = &state.items[0];
    assert_eq!(first.received, dec("80"));
    assert_eq!(first.issued, dec("20"));
    assert_eq!(first.current_stock, dec("60"));
    assert_eq!(first.current_value, dec("120"));
    assert_eq!(state.items[1].current_stock, dec("7"));

    assert_eq!(state.totals.item_count, 2);
    assert_eq!(state.totals.total_stock, dec("67"));
    assert_eq!(state.totals.total_value, dec("141"));
    assert_eq!(state.totals.total_received, dec("87"));
    assert_eq!(state.totals.total_issued, dec("20"));
}

#[test]
fn unknown_item_movements_are_ignored_and_reported() {
    let state = compute_state(&input(
        vec![item("RM-001", 0, "1", false)],
        vec![
            movement("RM-001", Direction::In, 10),
            movement("GHOST", Direction::In, 999),
            movement("GHOST", Direction::Out, 5),
        ],
    ));

    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].current_stock, dec("10"));
    assert_eq!(state.totals.total_received, dec("10"));
    let unknown = state
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::UnknownItem { item_id, .. } if item_id == "GHOST"))
        .count();
    assert_eq!(unknown, 2);
}

#[test]
fn zero_stock_with_manual_flag_is_critical() {
    let alert = alert_of("A", vec![item("A", 10, "1", true)], vec![]);
    assert_eq!(alert, AlertCategory::Critical);
}

#[test]
fn below_reorder_level_without_flag_is_medium() {
    let alert = alert_of(
        "A",
        vec![item("A", 10, "1", false)],
        vec![movement("A", Direction::In, 5)],
    );
    assert_eq!(alert, AlertCategory::Medium);
}

#[test]
fn below_reorder_level_with_flag_is_high() {
    let alert = alert_of(
        "A",
        vec![item("A", 10, "1", true)],
        vec![movement("A", Direction::In, 5)],
    );
    assert_eq!(alert, AlertCategory::High);
}

#[test]
fn issued_down_to_zero_is_critical() {
    let alert = alert_of(
        "A",
        vec![item("A", 0, "1", false)],
        vec![
            movement("A", Direction::In, 5),
            movement("A", Direction::Out, 5),
        ],
    );
    assert_eq!(alert, AlertCategory::Critical);
}

#[test]
fn alert_counts_match_item_categories() {
    let state = compute_state(&input(
        vec![
            item("critical", 0, "1", false),
            item("high", 0, "1", true),
            item("medium", 10, "1", false),
            item("fine", 1, "1", false),
        ],
        vec![
            movement("high", Direction::In, 50),
            movement("medium", Direction::In, 3),
            movement("fine", Direction::In, 3),
        ],
    ));

    let alerts = state.totals.alerts;
    assert_eq!((alerts.critical, alerts.high, alerts.medium), (1, 1, 1));
}

#[test]
fn non_numeric_quantity_is_isolated_to_its_item() {
    let master = [
        SheetRecord::new(
            2,
            [
                ("RM ID".to_string(), json!("RM-001")),
                ("Cost per Unit".to_string(), json!("10")),
            ],
        ),
        SheetRecord::new(
            3,
            [
                ("RM ID".to_string(), json!("RM-002")),
                ("Cost per Unit".to_string(), json!("4")),
            ],
        ),
    ];
    let stock_in = [
        SheetRecord::new(
            2,
            [
                ("RM ID".to_string(), json!("RM-001")),
                ("Quantity".to_string(), json!("ten")),
            ],
        ),
        SheetRecord::new(
            3,
            [
                ("RM ID".to_string(), json!("RM-001")),
                ("Quantity".to_string(), json!(6)),
            ],
        ),
        SheetRecord::new(
            4,
            [
                ("RM ID".to_string(), json!("RM-002")),
                ("Quantity".to_string(), json!(5)),
            ],
        ),
    ];

    let state = compute_state(&LedgerInput {
        items: coerce_items(&master),
        stock_in: coerce_movements(&stock_in, Direction::In),
        stock_out: coerce_movements(&[], Direction::Out),
    });

    assert_eq!(state.diagnostics.len(), 1);
    let Diagnostic::MalformedRow(issue) = &state.diagnostics[0] else {
        panic!("expected a malformed row diagnostic");
    };
    assert_eq!(issue.row, 2);
    assert!(matches!(issue.error, RowError::NotANumber { .. }));

    let flagged = &state.items[0];
    assert!(flagged.data_quality_issue);
    assert_eq!(flagged.current_stock, dec("6"));

    let clean = &state.items[1];
    assert!(!clean.data_quality_issue);
    assert_eq!(clean.current_stock, dec("5"));
    assert_eq!(clean.current_value, dec("20"));

    // RM-001 is flagged, so only RM-002 counts toward the value.
    assert_eq!(state.totals.total_value, dec("20"));
}

#[test]
fn malformed_master_row_drops_only_that_item() {
    let master = [
        SheetRecord::new(
            2,
            [
                ("RM ID".to_string(), json!("RM-001")),
                ("Reorder Level".to_string(), json!("n/a")),
            ],
        ),
        SheetRecord::new(3, [("RM ID".to_string(), json!("RM-002"))]),
    ];

    let state = compute_state(&LedgerInput {
        items: coerce_items(&master),
        ..LedgerInput::default()
    });

    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].item_id, "RM-002");
    assert_eq!(state.diagnostics.len(), 1);
    assert_eq!(state.diagnostics[0].item_id(), Some("RM-001"));
}

#[test]
fn duplicate_master_rows_keep_the_first() {
    let mut second = item("A", 0, "99", false);
    second.row = 5;
    let state = compute_state(&input(
        vec![item("A", 0, "1", false), second],
        vec![movement("A", Direction::In, 2)],
    ));

    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].unit_cost, dec("1"));
    assert_eq!(
        state.diagnostics,
        vec![Diagnostic::DuplicateItem {
            row: 5,
            item_id: "A".to_string()
        }]
    );
}

#[test]
fn overflowing_receipts_flag_the_item_without_panicking() {
    let huge = json!("60000000000000000000000000000");
    let master = [
        SheetRecord::new(2, [("RM ID".to_string(), json!("A"))]),
        SheetRecord::new(3, [("RM ID".to_string(), json!("B"))]),
    ];
    let stock_in = [
        SheetRecord::new(
            2,
            [
                ("RM ID".to_string(), json!("A")),
                ("Quantity".to_string(), huge.clone()),
            ],
        ),
        SheetRecord::new(
            3,
            [
                ("RM ID".to_string(), json!("A")),
                ("Quantity".to_string(), huge),
            ],
        ),
        SheetRecord::new(
            4,
            [
                ("RM ID".to_string(), json!("B")),
                ("Quantity".to_string(), json!(3)),
            ],
        ),
    ];
    let input = LedgerInput {
        items: coerce_items(&master),
        stock_in: coerce_movements(&stock_in, Direction::In),
        stock_out: coerce_movements(&[], Direction::Out),
    };
    assert!(input.stock_in.issues.is_empty());

    let state = compute_state(&input);

    let a = &state.items[0];
    assert!(a.data_quality_issue);
    assert_eq!(a.received, dec("60000000000000000000000000000"));
    assert!(state.diagnostics.contains(&Diagnostic::Overflow {
        item_id: "A".to_string(),
        field: "received".to_string(),
    }));

    let b = &state.items[1];
    assert!(!b.data_quality_issue);
    assert_eq!(b.current_stock, dec("3"));
}

#[test]
fn overflowing_value_is_left_out_of_the_total() {
    let state = compute_state(&input(
        vec![item("A", 0, "10000000000", false), item("B", 0, "2", false)],
        vec![
            StockMovement {
                quantity: Decimal::from_scientific("1e20").unwrap(),
                ..movement("A", Direction::In, 0)
            },
            movement("B", Direction::In, 4),
        ],
    ));

    let a = &state.items[0];
    assert!(a.data_quality_issue);
    assert_eq!(a.current_value, Decimal::ZERO);
    assert_eq!(
        state.diagnostics,
        vec![Diagnostic::Overflow {
            item_id: "A".to_string(),
            field: "current_value".to_string(),
        }]
    );
    assert_eq!(state.totals.total_value, dec("8"));
}

#[test]
fn empty_input_yields_empty_state() {
    let state = compute_state(&LedgerInput::default());
    assert!(state.items.is_empty());
    assert!(state.diagnostics.is_empty());
    assert_eq!(state.totals.total_value, Decimal::ZERO);
    assert_eq!(state.totals.alerts.total(), 0);
}

// ============================================================================
// Property Tests
// ============================================================================

fn arb_movements() -> impl Strategy<Value = Vec<(usize, bool, u32)>> {
    prop::collection::vec((0usize..6, any::<bool>(), 0u32..500), 0..40)
}

fn build(spec: &[(usize, bool, u32)]) -> Vec<StockMovement> {
    spec.iter()
        .map(|(id, inbound, qty)| {
            let direction = if *inbound { Direction::In } else { Direction::Out };
            movement(&format!("ID-{id}"), direction, i64::from(*qty))
        })
        .collect()
}

fn master() -> Vec<Item> {
    // ID-4 and ID-5 are never in the master.
    (0..4)
        .map(|i| item(&format!("ID-{i}"), 25, "1.5", i == 2))
        .collect()
}

proptest! {
    #[test]
    fn compute_state_is_pure(spec in arb_movements()) {
        let ledger = input(master(), build(&spec));
        prop_assert_eq!(compute_state(&ledger), compute_state(&ledger));
    }

    #[test]
    fn movement_order_does_not_matter(spec in arb_movements()) {
        let forward = compute_state(&input(master(), build(&spec)));
        let mut reversed_spec = spec.clone();
        reversed_spec.reverse();
        let reversed = compute_state(&input(master(), build(&reversed_spec)));
        prop_assert_eq!(forward.items, reversed.items);
        prop_assert_eq!(forward.totals, reversed.totals);
    }

    #[test]
    fn stock_is_sum_restricted_to_item(spec in arb_movements()) {
        let state = compute_state(&input(master(), build(&spec)));
        for derived in &state.items {
            let expected: i64 = spec
                .iter()
                .filter(|(id, _, _)| format!("ID-{id}") == derived.item_id)
                .map(|(_, inbound, qty)| if *inbound { i64::from(*qty) } else { -i64::from(*qty) })
                .sum();
            prop_assert_eq!(derived.current_stock, Decimal::from(expected));
        }
    }

    #[test]
    fn total_value_sums_item_values(spec in arb_movements()) {
        let state = compute_state(&input(master(), build(&spec)));
        let expected: Decimal = state.items.iter().map(|s| s.current_stock * s.unit_cost).sum();
        prop_assert_eq!(state.totals.total_value, expected);
    }
}
