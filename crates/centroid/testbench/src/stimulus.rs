//! Randomized stimulus for the nearest-centroid testbench.
//!
//! Testbench centroids are numbered `C1..C8`, with `C1` on the mask LSB.
//! The reference model indexes from the MSB, so its centroid set is the
//! testbench order reversed.

use std::collections::HashMap;

use centroid_selector::{select, CentroidSet, Mask, Point, CENTROID_COUNT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

// ── Stimulus ────────────────────────────────────────────────────────

/// One testbench input and the output the design must produce for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub mask: Mask,
    /// `centroids[k]` is `C(k+1)`.
    pub centroids: [Point; CENTROID_COUNT],
    pub query: Point,
    pub expected: Mask,
}

impl Stimulus {
    /// Build a stimulus and compute its expected result.
    pub fn new(mask: Mask, centroids: [Point; CENTROID_COUNT], query: Point) -> Self {
        let expected = select(mask, &Self::selector_order(&centroids), query);
        Self {
            mask,
            centroids,
            query,
            expected,
        }
    }

    /// Centroids in reference-model order (`C8` first).
    pub fn selector_order(centroids: &[Point; CENTROID_COUNT]) -> CentroidSet {
        let mut reversed = *centroids;
        reversed.reverse();
        CentroidSet::new(reversed)
    }

    /// Template values: `BITMASK`, `XC1..XC8`, `YC1..YC8`, `X`, `Y`, `RESULT`.
    pub fn substitutions(&self) -> HashMap<String, String> {
        let mut values = HashMap::with_capacity(2 * CENTROID_COUNT + 4);
        values.insert("BITMASK".to_string(), self.mask.bits().to_string());
        for (k, centroid) in self.centroids.iter().enumerate() {
            values.insert(format!("XC{}", k + 1), centroid.x.to_string());
            values.insert(format!("YC{}", k + 1), centroid.y.to_string());
        }
        values.insert("X".to_string(), self.query.x.to_string());
        values.insert("Y".to_string(), self.query.y.to_string());
        values.insert("RESULT".to_string(), self.expected.bits().to_string());
        values
    }
}

// ── Generator ───────────────────────────────────────────────────────

/// Uniform stimulus source.
pub struct StimulusGenerator<R: Rng> {
    rng: R,
}

impl StimulusGenerator<StdRng> {
    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> StimulusGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw mask, centroids and query uniformly over their full ranges.
    pub fn generate(&mut self) -> Stimulus {
        let mask = Mask::new(self.rng.gen());
        let centroids = std::array::from_fn(|_| self.point());
        let query = self.point();
        Stimulus::new(mask, centroids, query)
    }

    fn point(&mut self) -> Point {
        Point::new(self.rng.gen(), self.rng.gen())
    }
}

impl<R: Rng> Iterator for StimulusGenerator<R> {
    type Item = Stimulus;

    fn next(&mut self) -> Option<Stimulus> {
        Some(self.generate())
    }
}
