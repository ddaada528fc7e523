//! Quantized color-bucket index for candidate shortlisting
//!
//! Avoids full cells x pool distance scans when the pool is large by mapping
//! each tile's mean Lab color into a coarse bucket lattice. A cell's
//! shortlist is gathered by scanning buckets outward from the cell's own
//! bucket in rings of growing Chebyshev radius. Scan order and bucket
//! contents are fully determined by the pool, so identical inputs always
//! produce identical shortlists. Bucket granularity is a performance choice,
//! never a correctness requirement.

use crate::assignment::pool::TilePool;
use crate::io::configuration::LAB_BUCKETS_PER_AXIS;
use crate::signature::Signature;

// Lab axis spans used for quantization; sRGB inputs stay inside these
const L_RANGE: (f64, f64) = (0.0, 100.0);
const AB_RANGE: (f64, f64) = (-128.0, 128.0);

fn quantize_axis(value: f64, range: (f64, f64)) -> usize {
    let buckets = LAB_BUCKETS_PER_AXIS as f64;
    let scaled = (value - range.0) / (range.1 - range.0) * buckets;
    (scaled.floor().max(0.0) as usize).min(LAB_BUCKETS_PER_AXIS - 1)
}

fn bucket_coords(signature: &Signature) -> [usize; 3] {
    [
        quantize_axis(signature.lab[0], L_RANGE),
        quantize_axis(signature.lab[1], AB_RANGE),
        quantize_axis(signature.lab[2], AB_RANGE),
    ]
}

const fn flatten(coords: [usize; 3]) -> usize {
    (coords[0] * LAB_BUCKETS_PER_AXIS + coords[1]) * LAB_BUCKETS_PER_AXIS + coords[2]
}

/// Bucket lattice mapping quantized Lab colors to candidate pool indices
#[derive(Debug, Clone)]
pub struct BucketIndex {
    // Dense pool indices per flattened bucket, ascending within each bucket
    buckets: Vec<Vec<usize>>,
}

impl BucketIndex {
    /// Build the index over the current pool contents
    pub fn build(pool: &TilePool) -> Self {
        let bucket_count = LAB_BUCKETS_PER_AXIS * LAB_BUCKETS_PER_AXIS * LAB_BUCKETS_PER_AXIS;
        let mut buckets = vec![Vec::new(); bucket_count];

        for (position, record) in pool.iter().enumerate() {
            let flat = flatten(bucket_coords(&record.signature));
            if let Some(bucket) = buckets.get_mut(flat) {
                bucket.push(position);
            }
        }

        Self { buckets }
    }

    /// Gather a deterministic candidate shortlist for the given signature
    ///
    /// Scans bucket rings outward from the signature's own bucket until at
    /// least `min_candidates` dense indices are collected or the lattice is
    /// exhausted. The result is sorted ascending.
    pub fn shortlist(&self, signature: &Signature, min_candidates: usize) -> Vec<usize> {
        let center = bucket_coords(signature);
        let mut candidates = Vec::new();

        for radius in 0..LAB_BUCKETS_PER_AXIS {
            for (flat, bucket) in self.buckets.iter().enumerate() {
                if bucket.is_empty() {
                    continue;
                }
                let coords = unflatten(flat);
                if chebyshev(coords, center) == radius {
                    candidates.extend_from_slice(bucket);
                }
            }
            if candidates.len() >= min_candidates {
                break;
            }
        }

        candidates.sort_unstable();
        candidates
    }
}

const fn unflatten(flat: usize) -> [usize; 3] {
    [
        flat / (LAB_BUCKETS_PER_AXIS * LAB_BUCKETS_PER_AXIS),
        (flat / LAB_BUCKETS_PER_AXIS) % LAB_BUCKETS_PER_AXIS,
        flat % LAB_BUCKETS_PER_AXIS,
    ]
}

fn chebyshev(a: [usize; 3], b: [usize; 3]) -> usize {
    let d0 = a[0].abs_diff(b[0]);
    let d1 = a[1].abs_diff(b[1]);
    let d2 = a[2].abs_diff(b[2]);
    d0.max(d1).max(d2)
}
