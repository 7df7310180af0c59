//! Executive strategy dashboards rendered from worksheet rows.
//!
//! A `SheetSource` (local workbook or Google Sheets) feeds a TTL cache; each
//! dashboard page is a pure function of the cached rows.

pub mod cache;
pub mod error;
pub mod google_api;
pub mod services;
pub mod source;
pub mod state;
pub mod types;
pub mod util;
pub mod views;
pub mod watcher;

pub use error::DashboardError;
pub use services::{Dashboard, PageResult};
pub use state::AppState;
pub use views::Page;
