// Domain layer: core models, snapshot schema and ports (interfaces). No I/O here.

pub mod model;
pub mod ports;
pub mod snapshot;
