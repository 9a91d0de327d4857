pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalStorage, ManualClock, SnapshotGateway, SystemClock};
pub use app::{open_library, Terminal};
pub use config::LibraryConfig;
pub use crate::core::{
    catalog::Catalog,
    lending::{LendingEngine, Session},
    registry::PatronRegistry,
};
pub use domain::model::{Book, BookId, LoanTerm, Patron, Role};
pub use utils::error::{LibraryError, Result};
