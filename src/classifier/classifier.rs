use log::debug;

use super::builder::ClassifierBuilder;
use super::decode::decode_bitmap;
use super::error::ClassifierError;
use super::preprocess::to_input_tensor;
use super::rank::{rank, ScoredClass};
use super::readiness::{LoadState, ModelSlot, ReadinessGate};
use super::source::{self, ImageLocator};
use crate::model::{LoadedModel, Model};

/// An asynchronous image classifier gated on background model loading.
///
/// The model starts loading when the classifier is built and calls to
/// [`classify`](ImageClassifier::classify) issued before it finishes wait
/// for readiness instead of failing. The handle behind the classifier is
/// written once by the loader and only read afterwards, so the classifier
/// is cheap to clone and safe to share across tasks.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use percept::ImageClassifier;
///
/// let classifier = ImageClassifier::builder()
///     .with_model_url("models/mobilenet")
///     .build();
///
/// let ranked = classifier.classify("file:///tmp/cat.png").await?;
/// println!("best guess: {}", ranked[0].class_name);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ImageClassifier {
    slot: ModelSlot,
    gate: ReadinessGate,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ImageClassifier>();
    }
};

impl ImageClassifier {
    /// Creates a new ClassifierBuilder for fluent construction.
    pub fn builder() -> ClassifierBuilder {
        ClassifierBuilder::new()
    }

    /// Builds a classifier around an already-loaded model.
    ///
    /// No background load happens; the classifier is ready immediately.
    /// This is the seam for embedding custom inference backends.
    pub fn from_model(model: Box<dyn Model>, class_labels: Vec<String>) -> Self {
        let slot = ModelSlot::new();
        slot.publish_ready(LoadedModel {
            model,
            class_labels,
        });
        Self {
            slot,
            gate: ReadinessGate::default(),
        }
    }

    pub(crate) fn from_parts(slot: ModelSlot, gate: ReadinessGate) -> Self {
        Self { slot, gate }
    }

    /// Returns true once the model has loaded successfully.
    pub fn is_ready(&self) -> bool {
        matches!(self.slot.snapshot(), LoadState::Ready(_))
    }

    /// Returns information about the loaded model, or `None` while it is
    /// still loading or has failed.
    pub fn info(&self) -> Option<ClassifierInfo> {
        match self.slot.snapshot() {
            LoadState::Ready(loaded) => Some(ClassifierInfo {
                num_classes: loaded.class_labels.len(),
                class_labels: loaded.class_labels.clone(),
                input_size: loaded.model.input_size(),
            }),
            _ => None,
        }
    }

    /// Classifies a single image and returns classes ranked by confidence,
    /// best first.
    ///
    /// The locator may be a `data:image/...;base64,` payload, a `file://`
    /// URL, or an HTTP(S) URL pointing at a PNG or JPEG. If the model is
    /// still loading, the call waits for it within the configured readiness
    /// budget.
    ///
    /// # Errors
    /// - [`ClassifierError::Config`] / [`ClassifierError::ModelLoad`] if the
    ///   model can never become ready
    /// - [`ClassifierError::Timeout`] if it did not become ready in time
    /// - [`ClassifierError::InvalidInput`] for unclassifiable locators and
    ///   unreadable inputs
    /// - [`ClassifierError::Decode`] for unsupported content types or codec
    ///   failures
    /// - [`ClassifierError::Inference`] for preprocessing or model
    ///   execution failures
    pub async fn classify(&self, image_url: &str) -> Result<Vec<ScoredClass>, ClassifierError> {
        // Reject bad locators before spending any of the readiness budget.
        let locator = ImageLocator::classify(image_url)?;

        let loaded = self.gate.wait_ready(&self.slot).await?;

        let raw = source::resolve(&locator).await?;
        let bitmap = decode_bitmap(&raw)?;
        let pixels = to_input_tensor(&bitmap, loaded.model.input_size());
        let scores = loaded.model.predict(pixels)?;
        debug!(
            "inference produced {} scores for {} labels",
            scores.len(),
            loaded.class_labels.len()
        );

        Ok(rank(&scores, &loaded.class_labels))
    }
}

/// Information about the current state and configuration of a classifier.
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Number of classes the model distinguishes
    pub num_classes: usize,
    /// Ordered labels, index-aligned to the model output
    pub class_labels: Vec<String>,
    /// Input height and width the model expects
    pub input_size: (u32, u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use ndarray::Array4;
    use std::io::Cursor;

    /// Echoes a fixed score vector and records nothing.
    struct FixedModel {
        scores: Vec<f32>,
        input_size: (u32, u32),
    }

    impl Model for FixedModel {
        fn input_size(&self) -> (u32, u32) {
            self.input_size
        }

        fn predict(&self, pixels: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
            assert_eq!(
                pixels.shape(),
                &[1, self.input_size.0 as usize, self.input_size.1 as usize, 3]
            );
            Ok(self.scores.clone())
        }
    }

    fn classifier(scores: Vec<f32>, labels: &[&str]) -> ImageClassifier {
        ImageClassifier::from_model(
            Box::new(FixedModel {
                scores,
                input_size: (8, 8),
            }),
            labels.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn png_data_url() -> String {
        let mut png = Vec::new();
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 50, 10]));
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(&png))
    }

    #[tokio::test]
    async fn test_classify_embedded_image_ranks_scores() {
        let classifier = classifier(vec![0.1, 0.9, 0.5], &["cat", "dog", "fish"]);
        let ranked = classifier.classify(&png_data_url()).await.unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].class_name, "dog");
        assert_eq!(ranked[1].class_name, "fish");
        assert_eq!(ranked[2].class_name, "cat");
    }

    #[tokio::test]
    async fn test_invalid_locator_fails_before_gating() {
        let classifier = classifier(vec![0.5], &["a"]);
        let result = classifier.classify("not a locator").await;
        assert!(matches!(result, Err(ClassifierError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unsupported_embedded_type_is_decode_error() {
        let classifier = classifier(vec![0.5], &["a"]);
        let result = classifier
            .classify("data:image/gif;base64,R0lGODlh")
            .await;
        assert!(matches!(result, Err(ClassifierError::Decode(_))));
    }

    #[tokio::test]
    async fn test_info_reports_labels_and_input_size() {
        let classifier = classifier(vec![0.5, 0.5], &["a", "b"]);
        assert!(classifier.is_ready());
        let info = classifier.info().unwrap();
        assert_eq!(info.num_classes, 2);
        assert_eq!(info.class_labels, vec!["a", "b"]);
        assert_eq!(info.input_size, (8, 8));
    }

    #[tokio::test]
    async fn test_more_scores_than_labels_truncates() {
        let classifier = classifier(vec![0.1, 0.2, 0.3, 0.4, 0.5], &["a", "b", "c"]);
        let ranked = classifier.classify(&png_data_url()).await.unwrap();
        assert_eq!(ranked.len(), 3);
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let classifier = std::sync::Arc::new(classifier(vec![0.9, 0.1], &["a", "b"]));
        let mut handles = Vec::new();
        for _ in 0..3 {
            let classifier = std::sync::Arc::clone(&classifier);
            let url = png_data_url();
            handles.push(tokio::spawn(async move {
                classifier.classify(&url).await.unwrap()
            }));
        }
        for handle in handles {
            let ranked = handle.await.unwrap();
            assert_eq!(ranked[0].class_name, "a");
        }
    }
}
