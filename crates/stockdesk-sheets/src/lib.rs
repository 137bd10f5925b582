pub mod client;
pub mod memory;
pub mod postgres;

pub use client::{LedgerClient, NewMovement};
pub use memory::InMemorySheetStore;
pub use postgres::PgSheetStore;
