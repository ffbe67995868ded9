mod builder;
mod classifier;
mod decode;
mod error;
mod preprocess;
mod rank;
mod readiness;
mod source;

pub use builder::ClassifierBuilder;
pub use classifier::{ClassifierInfo, ImageClassifier};
pub use error::ClassifierError;
pub use rank::{rank, ScoredClass};
pub use readiness::ReadinessGate;
pub use source::{ImageLocator, RawImage};
