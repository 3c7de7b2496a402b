// Adapters layer: concrete implementations of the domain ports (classifier clients, storage)

pub mod classifier;
pub mod storage;

pub use classifier::{build_classifier, ChatCompletionClassifier, DefaultVerdictClassifier, HttpClassifier};
pub use storage::LocalStorage;
