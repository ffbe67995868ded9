//! Resolves a model locator into a loaded model plus its label list.
//!
//! Two locator kinds are supported: a local model directory holding
//! `model.onnx` and a sibling `metadata.json`, or a remote base URL serving
//! the same two documents over plain GET. Remote documents are cached under
//! a platform cache directory with SHA-256 sidecars so a restart does not
//! re-download an unchanged model.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::classifier::ClassifierError;
use crate::model::{LoadedModel, OnnxModel};
use crate::runtime::{create_session_builder, RuntimeConfig};

/// File name of the model definition inside a model directory.
pub const MODEL_FILE: &str = "model.onnx";
/// File name of the label metadata inside a model directory.
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("missing model URL")]
    MissingLocator,
    #[error("download error: {0}")]
    Download(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid model metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("model metadata has an empty labels list")]
    EmptyLabels,
    #[error("model file not found: {0}")]
    MissingFile(PathBuf),
    #[error("cached file failed integrity check after download: {0}")]
    CacheIntegrity(PathBuf),
    #[error("runtime error: {0}")]
    Runtime(#[from] ort::Error),
    #[error("model error: {0}")]
    Model(String),
}

impl From<LoadError> for ClassifierError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::MissingLocator => ClassifierError::Config("missing model URL".to_string()),
            other => ClassifierError::ModelLoad(other.to_string()),
        }
    }
}

/// The `metadata.json` document sitting next to the model definition.
#[derive(Debug, Deserialize)]
struct ModelMetadata {
    /// Ordered class labels, index-aligned to the model's output vector.
    labels: Vec<String>,
}

pub struct ModelLoader {
    cache_dir: PathBuf,
    runtime_config: RuntimeConfig,
}

impl ModelLoader {
    /// Creates a loader using the default cache directory.
    pub fn new(runtime_config: RuntimeConfig) -> io::Result<Self> {
        Self::with_cache_dir(Self::default_cache_dir(), runtime_config)
    }

    pub fn with_cache_dir<P: AsRef<Path>>(
        cache_dir: P,
        runtime_config: RuntimeConfig,
    ) -> io::Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            runtime_config,
        })
    }

    /// Returns the default model cache directory.
    pub fn default_cache_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("PERCEPT_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("percept").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("percept").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("percept").join("models")
    }

    /// Loads the model the locator points at, together with its labels.
    ///
    /// Locators starting with `http://` or `https://` are treated as a
    /// served model directory; everything else is a local directory path.
    /// Every failure here is terminal: the caller records it once and never
    /// retries the load.
    pub async fn load(&self, locator: &str) -> Result<LoadedModel, LoadError> {
        if locator.is_empty() {
            return Err(LoadError::MissingLocator);
        }

        let (model_path, metadata_path) =
            if locator.starts_with("http://") || locator.starts_with("https://") {
                self.fetch_remote(locator).await?
            } else {
                let dir = Path::new(locator);
                (dir.join(MODEL_FILE), dir.join(METADATA_FILE))
            };

        let metadata = Self::read_metadata(&metadata_path)?;
        if !model_path.exists() {
            return Err(LoadError::MissingFile(model_path));
        }

        info!("loading model from {:?}", model_path);
        let session = create_session_builder(&self.runtime_config)?.commit_from_file(&model_path)?;
        let model = OnnxModel::from_session(session).map_err(|e| LoadError::Model(e.to_string()))?;

        info!("model ready with {} classes", metadata.labels.len());
        Ok(LoadedModel {
            model: Box::new(model),
            class_labels: metadata.labels,
        })
    }

    fn read_metadata(path: &Path) -> Result<ModelMetadata, LoadError> {
        if !path.exists() {
            return Err(LoadError::MissingFile(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let metadata: ModelMetadata = serde_json::from_slice(&bytes)?;
        if metadata.labels.is_empty() {
            return Err(LoadError::EmptyLabels);
        }
        Ok(metadata)
    }

    /// Downloads (or reuses the cached copy of) the two remote model
    /// documents, returning their local paths.
    async fn fetch_remote(&self, base_url: &str) -> Result<(PathBuf, PathBuf), LoadError> {
        let base = base_url.trim_end_matches('/');
        let model_dir = self.cache_dir.join(cache_key(base));
        fs::create_dir_all(&model_dir)?;

        let model_path = model_dir.join(MODEL_FILE);
        let metadata_path = model_dir.join(METADATA_FILE);
        self.ensure_cached(&format!("{}/{}", base, MODEL_FILE), &model_path)
            .await?;
        self.ensure_cached(&format!("{}/{}", base, METADATA_FILE), &metadata_path)
            .await?;

        Ok((model_path, metadata_path))
    }

    async fn ensure_cached(&self, url: &str, path: &Path) -> Result<(), LoadError> {
        if path.exists() {
            if self.verify_cached(path)? {
                info!("reusing cached copy of {} at {:?}", url, path);
                return Ok(());
            }
            warn!("cached copy at {:?} failed integrity check, redownloading", path);
        }
        self.download(url, path).await
    }

    async fn download(&self, url: &str, path: &Path) -> Result<(), LoadError> {
        info!("downloading {} to {:?}", url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        info!("downloaded {} bytes", bytes.len());

        fs::write(path, &bytes)?;
        fs::write(sidecar_path(path), hash_hex(&bytes))?;

        // Verify after writing
        if !self.verify_cached(path)? {
            return Err(LoadError::CacheIntegrity(path.to_path_buf()));
        }
        Ok(())
    }

    /// Checks a cached file against its SHA-256 sidecar. Missing sidecar
    /// counts as invalid.
    fn verify_cached(&self, path: &Path) -> Result<bool, LoadError> {
        let sidecar = sidecar_path(path);
        if !sidecar.exists() {
            return Ok(false);
        }
        let expected = fs::read_to_string(&sidecar)?;
        let actual = hash_hex(&fs::read(path)?);
        Ok(expected.trim() == actual)
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".sha256");
    PathBuf::from(name)
}

fn hash_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Directory name for a remote model, derived from its base URL.
fn cache_key(base_url: &str) -> String {
    hash_hex(base_url.as_bytes())[..16].to_string()
}
