//! Visual signature extraction from images
//!
//! Every image (target cell or candidate tile) is reduced to a fixed-size
//! descriptor: the mean CIE Lab color plus a coarse block-luminance grid.
//! Statistics are computed on a fixed-resolution down-sample so the
//! signature cost is constant regardless of source resolution and distances
//! stay comparable across arbitrary source sizes.

use crate::io::configuration::{
    BRIGHTNESS_LOW_MAX, BRIGHTNESS_MEDIUM_MAX, SIGNATURE_SAMPLE_SIZE, STRUCTURE_BLOCKS,
};
use crate::io::error::{Result, invalid_image};
use crate::signature::colorspace::srgb_to_lab;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use ndarray::{Array2, s};

/// Number of block-luminance values in the structure descriptor
pub const STRUCTURE_LEN: usize = STRUCTURE_BLOCKS * STRUCTURE_BLOCKS;

/// Coarse brightness band of an image, matching the three-way segment
/// classification used for candidate grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BrightnessBand {
    /// Mean L* at or below the low threshold
    Low,
    /// Mean L* between the low and medium thresholds
    Medium,
    /// Mean L* above the medium threshold
    High,
}

/// Fixed-length visual signature of an image
///
/// Extraction is deterministic and pure: identical pixel data always yields
/// an identical signature.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Signature {
    /// Mean CIE Lab color over the normalized sample
    pub lab: [f64; 3],
    /// Mean L* per structure block, row-major
    pub luma_blocks: [f64; STRUCTURE_LEN],
}

impl Signature {
    /// Mean lightness (L*) of the image, 0..100
    pub fn brightness(&self) -> f64 {
        self.lab[0]
    }

    /// Classify the signature into a coarse brightness band
    pub fn brightness_band(&self) -> BrightnessBand {
        let l = self.brightness();
        if l <= BRIGHTNESS_LOW_MAX {
            BrightnessBand::Low
        } else if l <= BRIGHTNESS_MEDIUM_MAX {
            BrightnessBand::Medium
        } else {
            BrightnessBand::High
        }
    }
}

/// Extract the visual signature of an image
///
/// The image is resampled to a fixed `SIGNATURE_SAMPLE_SIZE` square with a
/// triangle filter before any statistics are computed, making the result
/// insensitive to the source's resolution and aspect ratio.
///
/// # Errors
///
/// Returns `MosaicError::InvalidImage` if the image has zero area.
pub fn extract(image: &RgbaImage) -> Result<Signature> {
    if image.width() == 0 || image.height() == 0 {
        return Err(invalid_image(&"zero-area image"));
    }

    let sample = imageops::resize(
        image,
        SIGNATURE_SAMPLE_SIZE,
        SIGNATURE_SAMPLE_SIZE,
        FilterType::Triangle,
    );

    let side = SIGNATURE_SAMPLE_SIZE as usize;
    let mut luma = Array2::<f64>::zeros((side, side));
    let mut lab_sum = [0.0_f64; 3];

    for (x, y, pixel) in sample.enumerate_pixels() {
        let lab = srgb_to_lab([pixel.0[0], pixel.0[1], pixel.0[2]]);
        lab_sum[0] += lab[0];
        lab_sum[1] += lab[1];
        lab_sum[2] += lab[2];
        if let Some(value) = luma.get_mut([y as usize, x as usize]) {
            *value = lab[0];
        }
    }

    let pixel_count = (side * side) as f64;
    let lab = [
        lab_sum[0] / pixel_count,
        lab_sum[1] / pixel_count,
        lab_sum[2] / pixel_count,
    ];

    let mut luma_blocks = [0.0_f64; STRUCTURE_LEN];
    let block = side / STRUCTURE_BLOCKS;
    for (index, value) in luma_blocks.iter_mut().enumerate() {
        let row = index / STRUCTURE_BLOCKS;
        let col = index % STRUCTURE_BLOCKS;
        let view = luma.slice(s![
            row * block..(row + 1) * block,
            col * block..(col + 1) * block
        ]);
        *value = view.mean().unwrap_or(0.0);
    }

    Ok(Signature { lab, luma_blocks })
}
