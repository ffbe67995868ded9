//! Bitmap-to-tensor conversion matching the model's trained preprocessing.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

/// Converts a decoded bitmap into a `[1, height, width, 3]` input tensor.
///
/// The bitmap is resized with nearest-neighbor resampling to the model's
/// declared input size, and pixel values are scaled from `[0, 255]` into
/// `[-1, 1]` via `(x - 127.5) / 127.5`.
pub fn to_input_tensor(bitmap: &RgbImage, (height, width): (u32, u32)) -> Array4<f32> {
    let resized;
    let pixels = if bitmap.dimensions() == (width, height) {
        bitmap
    } else {
        resized = imageops::resize(bitmap, width, height, FilterType::Nearest);
        &resized
    };

    let mut tensor = Array4::<f32>::zeros((1, height as usize, width as usize, 3));
    for (x, y, pixel) in pixels.enumerate_pixels() {
        for channel in 0..3 {
            tensor[[0, y as usize, x as usize, channel]] =
                (pixel[channel] as f32 - 127.5) / 127.5;
        }
    }
    tensor
}
