//! Feature extraction — fixed-resolution crop normalization and the
//! f32 ↔ byte-blob codec used by the feature store.

use image::{imageops::FilterType, RgbImage};

// --- Named constants ---
/// Side length of a normalized face crop.
pub const SAMPLE_SIZE: u32 = 50;
/// Dimensionality of a flattened feature vector (50 × 50 × RGB).
pub const FEATURE_DIM: usize = (SAMPLE_SIZE * SAMPLE_SIZE * 3) as usize;

/// Resize a face crop to the canonical resolution and flatten it.
///
/// Flatten order is row-major with interleaved RGB channels; every vector
/// in the store uses this exact order, so it must never change without a
/// store schema bump.
pub fn normalize_crop(crop: &RgbImage) -> Vec<f32> {
    let resized = if crop.width() == SAMPLE_SIZE && crop.height() == SAMPLE_SIZE {
        crop.clone()
    } else {
        image::imageops::resize(crop, SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle)
    };
    resized.into_raw().iter().map(|&b| b as f32).collect()
}

/// Encode a feature vector as little-endian f32 bytes for BLOB storage.
pub fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

/// Decode a BLOB back into a feature vector.
///
/// Returns `None` if the blob length is not a multiple of 4.
pub fn blob_to_vector(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}
