pub mod ledger;
pub mod views;

pub use ledger::{LedgerInput, LedgerState, LedgerTotals, compute_state};
pub use views::{DEFAULT_TOP_N, DailyFlow, alerts, daily_flow, search, top_by_stock};
