//! I/O helpers for single-band rasters and JSON.
//!
//! - `load_grayscale_f32`: read a PNG/TIFF/etc. into an owned f32 raster
//!   holding the 16-bit luminance values.
//! - `save_normalized_f32`: write an `ImageF32` to a grayscale PNG, stretching
//!   its finite range to [0, 255].
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageF32, ImageView};
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert it to a single-band f32 raster.
pub fn load_grayscale_f32(path: &Path) -> Result<ImageF32, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma16();
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img.into_raw().into_iter().map(f32::from).collect();
    ImageF32::from_vec(width, height, data)
        .ok_or_else(|| format!("Decoded buffer of {} has unexpected size", path.display()))
}

/// Save a float raster to a grayscale PNG, mapping its finite range onto
/// [0, 255]. Non-finite samples are written as black.
pub fn save_normalized_f32(image: &ImageF32, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let (lo, hi) = image.finite_range().unwrap_or((0.0, 0.0));
    let range = hi - lo;
    let mut out = GrayImage::new(image.w as u32, image.h as u32);
    for (y, row) in image.rows().enumerate() {
        for (x, &px) in row.iter().enumerate() {
            let v = if px.is_finite() && range > 0.0 {
                ((px - lo) / range * 255.0).clamp(0.0, 255.0)
            } else {
                0.0
            };
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
