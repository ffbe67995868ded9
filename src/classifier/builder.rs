use std::path::PathBuf;
use std::time::Duration;

use log::error;

use super::classifier::ImageClassifier;
use super::error::ClassifierError;
use super::readiness::{ModelSlot, ReadinessGate};
use crate::model_loader::ModelLoader;
use crate::runtime::RuntimeConfig;

/// A builder for constructing an [`ImageClassifier`] with a fluent interface.
///
/// Construction never fails and never blocks on the model: `build` spawns
/// the load in the background and returns immediately. A missing or empty
/// model URL puts the classifier into a permanent failure state that every
/// `classify` call reports without waiting.
#[derive(Debug, Default)]
pub struct ClassifierBuilder {
    model_url: Option<String>,
    runtime_config: RuntimeConfig,
    gate: ReadinessGate,
    cache_dir: Option<PathBuf>,
}

impl ClassifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model locator: either a local model directory or the base
    /// URL of a served one.
    pub fn with_model_url(mut self, model_url: impl Into<String>) -> Self {
        self.model_url = Some(model_url.into());
        self
    }

    /// Sets the runtime configuration for ONNX model execution.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides how long and how often `classify` waits for the model to
    /// finish loading (defaults: 1s delay, 20 attempts).
    pub fn with_readiness(mut self, poll_delay: Duration, max_attempts: u32) -> Self {
        self.gate = ReadinessGate::new(poll_delay, max_attempts);
        self
    }

    /// Overrides the cache directory used for remote model documents.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Builds the classifier and kicks off the model load in the background.
    ///
    /// Must be called within a tokio runtime.
    pub fn build(self) -> ImageClassifier {
        let slot = ModelSlot::new();

        match self.model_url {
            None => {
                slot.publish_failed(ClassifierError::Config("missing model URL".to_string()))
            }
            Some(url) if url.is_empty() => {
                slot.publish_failed(ClassifierError::Config("missing model URL".to_string()))
            }
            Some(url) => {
                let task_slot = slot.clone();
                let runtime_config = self.runtime_config;
                let cache_dir = self.cache_dir;
                tokio::spawn(async move {
                    let loader = match cache_dir {
                        Some(dir) => ModelLoader::with_cache_dir(dir, runtime_config),
                        None => ModelLoader::new(runtime_config),
                    };
                    let result = match loader {
                        Ok(loader) => loader.load(&url).await,
                        Err(e) => Err(e.into()),
                    };
                    match result {
                        Ok(loaded) => task_slot.publish_ready(loaded),
                        Err(e) => {
                            error!("model load from '{}' failed: {}", url, e);
                            task_slot.publish_failed(e.into());
                        }
                    }
                });
            }
        }

        ImageClassifier::from_parts(slot, self.gate)
    }
}
