// Domain layer: row/record models, verdicts and the ports the pipeline is built on.

pub mod model;
pub mod ports;
pub mod verdict;
