pub mod engine;
pub mod mapper;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod projector;
pub mod report;
pub mod results;

pub use crate::domain::model::{AnalysisResult, CanonicalRecord, Extraction, RunReport};
pub use crate::domain::ports::{Classifier, ConfigProvider, Pipeline, RunObserver, Storage};
pub use crate::utils::error::Result;
