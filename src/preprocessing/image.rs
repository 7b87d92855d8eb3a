use crate::error::ApiError;
use image::imageops::FilterType;
use ndarray::{Array, Array4, Axis};

/// Preprocesses an uploaded image into the classifier's input tensor.
///
/// MobileNet convention: 224x224 RGB, channels-last, pixels scaled to
/// [-1, 1]. Returns a tensor of shape [1, 224, 224, 3].
pub fn process_bytes(buffer: &[u8]) -> Result<Array4<f32>, ApiError> {
    // 1. Load image from bytes (guess format)
    let img = image::load_from_memory(buffer).map_err(ApiError::ImageError)?;

    // 2. Resize
    let resized = img.resize_exact(224, 224, FilterType::Triangle);

    // 3. Scale pixels to [-1, 1], keeping [Height, Width, Channels] order
    let mut scaled = Vec::with_capacity(224 * 224 * 3);
    for pixel in resized.to_rgb8().pixels() {
        for channel in 0..3 {
            scaled.push(f32::from(pixel[channel]) / 127.5 - 1.0);
        }
    }

    let array = Array::from_shape_vec((224, 224, 3), scaled)
        .map_err(|e| ApiError::Internal(format!("image tensor shape: {}", e)))?;

    // Add batch dimension -> [1, 224, 224, 3]
    Ok(array.insert_axis(Axis(0)))
}
