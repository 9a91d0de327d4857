pub mod bootstrap;
pub mod catalog;
pub mod lending;
pub mod query;
pub mod registry;
pub mod snapshot;

pub use crate::domain::model::{Book, BookId, LoanTerm, Patron, Role};
pub use crate::domain::ports::{Clock, PersistenceGateway, Storage};
pub use crate::domain::snapshot::Snapshot;
pub use crate::utils::error::Result;
