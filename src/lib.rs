//! An asynchronous image classification pipeline using ONNX models.
//!
//! A classifier is built around a model locator (a local model directory or
//! the base URL of a served one). The model loads in the background;
//! classification calls issued before it finishes wait for readiness with a
//! bounded retry budget instead of failing. Images may come from a remote
//! URL, a local file, or an inline `data:` payload, in PNG or JPEG form.
//!
//! # Basic Usage
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use percept::ImageClassifier;
//!
//! let classifier = ImageClassifier::builder()
//!     .with_model_url("https://models.example.com/mobilenet/")
//!     .build();
//!
//! // The model may still be loading here; classify waits for it.
//! let ranked = classifier.classify("https://example.com/photos/cat.jpg").await?;
//! for entry in &ranked {
//!     println!("{}: {:.3}", entry.class_name, entry.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Model layout
//!
//! A model directory (local or served) holds two documents: `model.onnx`,
//! the model definition, and `metadata.json`, carrying at least a `labels`
//! array ordered to match the model's output vector:
//!
//! ```json
//! { "labels": ["cat", "dog", "fish"] }
//! ```
//!
//! # Custom backends
//!
//! The inference runtime sits behind the [`Model`] trait;
//! [`ImageClassifier::from_model`] builds a ready classifier around any
//! implementation, which is also how the test suite substitutes in-memory
//! models.

pub mod classifier;
pub mod model;
pub mod model_loader;
mod runtime;

pub use classifier::{
    rank, ClassifierBuilder, ClassifierError, ClassifierInfo, ImageClassifier, ImageLocator,
    RawImage, ReadinessGate, ScoredClass,
};
pub use model::{LoadedModel, Model, OnnxModel};
pub use model_loader::{LoadError, ModelLoader};
pub use runtime::{create_session_builder, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
