use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ndarray::Array4;
use percept::{ClassifierError, ImageClassifier, Model};

/// In-memory model that scores brighter images higher on class 0.
struct BrightnessModel {
    classes: usize,
}

impl Model for BrightnessModel {
    fn input_size(&self) -> (u32, u32) {
        (16, 16)
    }

    fn predict(&self, pixels: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let mean = pixels.iter().sum::<f32>() / pixels.len() as f32;
        // Class 0 tracks brightness, the rest fall off from it.
        Ok((0..self.classes)
            .map(|i| mean - i as f32 * 0.1)
            .collect())
    }
}

fn test_classifier(labels: &[&str]) -> ImageClassifier {
    ImageClassifier::from_model(
        Box::new(BrightnessModel {
            classes: labels.len(),
        }),
        labels.iter().map(|s| s.to_string()).collect(),
    )
}

fn png_bytes(pixel: [u8; 3]) -> Vec<u8> {
    let mut bytes = Vec::new();
    let img = image::RgbImage::from_pixel(10, 10, image::Rgb(pixel));
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn jpeg_bytes(pixel: [u8; 3]) -> Vec<u8> {
    let mut bytes = Vec::new();
    let img = image::RgbImage::from_pixel(10, 10, image::Rgb(pixel));
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("percept-classifier-tests")
        .join(std::process::id().to_string());
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn test_end_to_end_local_png() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = test_classifier(&["a", "b", "c"]);
    let path = temp_file("white.png", &png_bytes([255, 255, 255]));

    let ranked = classifier.classify(&format!("file://{}", path.display())).await?;

    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0].class_name, "a");
    assert!(ranked[0].score > ranked[1].score);
    assert!(ranked[1].score > ranked[2].score);
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_embedded_jpeg() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = test_classifier(&["a", "b"]);
    let url = format!(
        "data:image/jpeg;base64,{}",
        BASE64.encode(jpeg_bytes([128, 128, 128]))
    );

    let ranked = classifier.classify(&url).await?;
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].class_name, "a");
    Ok(())
}

#[tokio::test]
async fn test_local_file_type_is_sniffed_not_trusted() -> Result<(), Box<dyn std::error::Error>> {
    // JPEG bytes behind a .png extension must still decode via the JPEG
    // path, because the type comes from the content.
    let classifier = test_classifier(&["a"]);
    let path = temp_file("lying-extension.png", &jpeg_bytes([10, 10, 10]));

    let ranked = classifier.classify(&format!("file://{}", path.display())).await?;
    assert_eq!(ranked.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_local_file_is_invalid_input() {
    let classifier = test_classifier(&["a"]);
    let result = classifier.classify("file:///does/not/exist.png").await;
    assert!(matches!(result, Err(ClassifierError::InvalidInput(_))));
}

#[tokio::test]
async fn test_non_image_bytes_are_a_decode_error() {
    let classifier = test_classifier(&["a"]);
    let path = temp_file("not-an-image.png", b"plain text pretending to be a png");
    let result = classifier.classify(&format!("file://{}", path.display())).await;
    assert!(matches!(result, Err(ClassifierError::Decode(_))));
}

#[tokio::test]
async fn test_unclassifiable_locator_is_rejected() {
    let classifier = test_classifier(&["a"]);
    for locator in ["", "cat.png", "ftp://host/cat.png", "https://example.com/page"] {
        let result = classifier.classify(locator).await;
        assert!(
            matches!(result, Err(ClassifierError::InvalidInput(_))),
            "locator {:?} should be invalid",
            locator
        );
    }
}

#[tokio::test]
async fn test_scores_need_not_be_normalized() -> Result<(), Box<dyn std::error::Error>> {
    let classifier = test_classifier(&["a", "b", "c"]);
    let url = format!(
        "data:image/png;base64,{}",
        BASE64.encode(png_bytes([255, 255, 255]))
    );
    let ranked = classifier.classify(&url).await?;
    let sum: f32 = ranked.iter().map(|entry| entry.score).sum();
    // Raw model outputs, no softmax applied.
    assert!((sum - 1.0).abs() > 1e-6);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_calls_share_one_classifier() {
    let classifier = Arc::new(test_classifier(&["a", "b"]));
    let url = format!(
        "data:image/png;base64,{}",
        BASE64.encode(png_bytes([200, 200, 200]))
    );

    let mut handles = Vec::new();
    for _ in 0..4 {
        let classifier = Arc::clone(&classifier);
        let url = url.clone();
        handles.push(tokio::spawn(
            async move { classifier.classify(&url).await },
        ));
    }
    for handle in handles {
        let ranked = handle.await.unwrap().unwrap();
        assert_eq!(ranked[0].class_name, "a");
    }
}
