pub mod config;
pub mod contracts;
pub mod db;

pub use config::ServiceConfig;
pub use contracts::{
    AppendMovementResponse, DashboardView, MovementsResponse, StockInForm, StockOutForm,
    StockTableQuery, StockTableResponse, TrendResponse,
};
pub use db::connect_database;
