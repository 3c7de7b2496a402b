pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{build_classifier, LocalStorage};
pub use config::TomlConfig;
pub use core::{
    engine::TriageEngine,
    orchestrator::{BatchOrchestrator, CancelFlag, ProgressWatch, TracingObserver},
    pipeline::TriagePipeline,
    results::{ResultFilter, ResultSet},
};
pub use utils::error::{Result, TriageError};
