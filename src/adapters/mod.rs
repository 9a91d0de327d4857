// Adapters layer: concrete implementations of the domain ports (storage, snapshot gateway, clock).

pub mod clock;
pub mod snapshot_gateway;
pub mod storage;

pub use clock::{ManualClock, SystemClock};
pub use snapshot_gateway::SnapshotGateway;
pub use storage::LocalStorage;
