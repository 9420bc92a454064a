// Domain layer: draw models and the source port. No I/O here.

pub mod model;
pub mod ports;
