//! Value types for nearest-centroid selection.
//!
//! Defines points, the eight-entry centroid set and the MSB-first
//! eligibility mask. Everything here is `Copy`; nothing is shared.

use serde::{Deserialize, Serialize};

use crate::error::{SelectorError, SelectorResult};

/// Number of candidate centroids, one per mask bit.
pub const CENTROID_COUNT: usize = 8;

/// Largest Manhattan distance between two byte-coordinate points.
pub const MAX_DISTANCE: u16 = 2 * u8::MAX as u16;

/// Running-minimum seed; strictly above any reachable distance.
pub const UNSEEN_DISTANCE: u16 = MAX_DISTANCE + 1;

// ── Point ───────────────────────────────────────────────────────────

/// A point on the 256x256 grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u8,
    pub y: u8,
}

impl Point {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, |dx| + |dy|.
    pub fn manhattan(&self, other: &Point) -> u16 {
        u16::from(self.x.abs_diff(other.x)) + u16::from(self.y.abs_diff(other.y))
    }
}

impl From<(u8, u8)> for Point {
    fn from((x, y): (u8, u8)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ── Mask ────────────────────────────────────────────────────────────

/// Eight eligibility flags packed into a byte.
///
/// Index 0 is the most-significant bit and index 7 the least, so the
/// integer `0b1100_0000` marks centroids 0 and 1 as eligible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mask(u8);

impl Mask {
    pub const EMPTY: Mask = Mask(0);
    pub const ALL: Mask = Mask(u8::MAX);

    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of eligible centroids.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether centroid `index` is eligible. Indices past 7 never are.
    pub const fn is_eligible(self, index: usize) -> bool {
        index < CENTROID_COUNT && self.0 & Self::bit(index) != 0
    }

    /// Copy of this mask with centroid `index` made ineligible.
    pub const fn without(self, index: usize) -> Self {
        Self(self.0 & !Self::bit(index))
    }

    /// Copy of this mask with every index before `index` cleared.
    pub const fn retaining_from(self, index: usize) -> Self {
        Self(self.0 & (u8::MAX >> index))
    }

    /// Whether every bit of `self` is also set in `other`.
    pub const fn is_subset_of(self, other: Mask) -> bool {
        self.0 & !other.0 == 0
    }

    /// Eligible indices in ascending order.
    pub fn eligible_indices(self) -> impl Iterator<Item = usize> {
        (0..CENTROID_COUNT).filter(move |&i| self.is_eligible(i))
    }

    /// Builds a mask from MSB-first flags.
    pub fn from_flags(flags: [bool; CENTROID_COUNT]) -> Self {
        let bits = flags
            .iter()
            .fold(0u8, |acc, &flag| (acc << 1) | u8::from(flag));
        Self(bits)
    }

    /// MSB-first flags.
    pub fn to_flags(self) -> [bool; CENTROID_COUNT] {
        std::array::from_fn(|i| self.is_eligible(i))
    }

    const fn bit(index: usize) -> u8 {
        0x80 >> index
    }
}

impl From<u8> for Mask {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<Mask> for u8 {
    fn from(mask: Mask) -> Self {
        mask.0
    }
}

impl TryFrom<i64> for Mask {
    type Error = SelectorError;

    fn try_from(value: i64) -> SelectorResult<Self> {
        u8::try_from(value)
            .map(Self)
            .map_err(|_| SelectorError::MaskOutOfRange(value))
    }
}

impl std::fmt::Binary for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Binary::fmt(&self.0, f)
    }
}

impl std::fmt::Display for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}

// ── Centroid Set ────────────────────────────────────────────────────

/// Exactly eight candidate centroids, indexed to match [`Mask`] bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CentroidSet([Point; CENTROID_COUNT]);

impl CentroidSet {
    pub const fn new(points: [Point; CENTROID_COUNT]) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[Point; CENTROID_COUNT] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Point> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.0.iter()
    }

    /// Distance from `query` to every centroid, eligible or not.
    pub fn distances(&self, query: &Point) -> [u16; CENTROID_COUNT] {
        std::array::from_fn(|i| query.manhattan(&self.0[i]))
    }
}

impl From<[Point; CENTROID_COUNT]> for CentroidSet {
    fn from(points: [Point; CENTROID_COUNT]) -> Self {
        Self(points)
    }
}

impl TryFrom<&[Point]> for CentroidSet {
    type Error = SelectorError;

    fn try_from(points: &[Point]) -> SelectorResult<Self> {
        let points: [Point; CENTROID_COUNT] =
            points
                .try_into()
                .map_err(|_| SelectorError::CentroidCount {
                    expected: CENTROID_COUNT,
                    actual: points.len(),
                })?;
        Ok(Self(points))
    }
}

impl<'a> IntoIterator for &'a CentroidSet {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_is_symmetric() {
        let a = Point::new(10, 200);
        let b = Point::new(250, 3);
        assert_eq!(a.manhattan(&b), 240 + 197);
        assert_eq!(a.manhattan(&b), b.manhattan(&a));
    }

    #[test]
    fn manhattan_extremes() {
        assert_eq!(Point::new(0, 0).manhattan(&Point::new(255, 255)), MAX_DISTANCE);
        assert_eq!(Point::new(7, 7).manhattan(&Point::new(7, 7)), 0);
        assert!(UNSEEN_DISTANCE > MAX_DISTANCE);
    }

    #[test]
    fn mask_bits_are_msb_first() {
        let mask = Mask::new(0b1000_0001);
        assert!(mask.is_eligible(0));
        assert!(mask.is_eligible(7));
        assert!(!mask.is_eligible(1));
        assert!(!mask.is_eligible(8));
        assert_eq!(mask.eligible_indices().collect::<Vec<_>>(), vec![0, 7]);
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn mask_without_and_retaining_from() {
        let mask = Mask::ALL;
        assert_eq!(mask.without(0), Mask::new(0b0111_1111));
        assert_eq!(mask.without(7), Mask::new(0b1111_1110));
        assert_eq!(mask.retaining_from(0), Mask::ALL);
        assert_eq!(mask.retaining_from(3), Mask::new(0b0001_1111));
        assert_eq!(mask.retaining_from(7), Mask::new(0b0000_0001));
    }

    #[test]
    fn mask_flags_round_trip() {
        let flags = [true, true, false, false, false, false, false, true];
        let mask = Mask::from_flags(flags);
        assert_eq!(mask.bits(), 0b1100_0001);
        assert_eq!(mask.to_flags(), flags);
    }

    #[test]
    fn mask_subset() {
        assert!(Mask::new(0b0100_0000).is_subset_of(Mask::new(0b1100_0000)));
        assert!(!Mask::new(0b0010_0000).is_subset_of(Mask::new(0b1100_0000)));
        assert!(Mask::EMPTY.is_subset_of(Mask::EMPTY));
    }

    #[test]
    fn mask_try_from_range() {
        assert_eq!(Mask::try_from(255_i64).unwrap(), Mask::ALL);
        assert_eq!(Mask::try_from(0_i64).unwrap(), Mask::EMPTY);
        assert_eq!(
            Mask::try_from(256_i64).unwrap_err(),
            SelectorError::MaskOutOfRange(256)
        );
        assert!(Mask::try_from(-3_i64).is_err());
    }

    #[test]
    fn mask_display_matches_python_bin() {
        assert_eq!(Mask::new(0b0110_0000).to_string(), "0b1100000");
        assert_eq!(Mask::EMPTY.to_string(), "0b0");
        assert_eq!(format!("{:08b}", Mask::new(0b0110_0000)), "01100000");
    }

    #[test]
    fn centroid_set_rejects_wrong_length() {
        let points = vec![Point::default(); 7];
        let err = CentroidSet::try_from(points.as_slice()).unwrap_err();
        assert_eq!(
            err,
            SelectorError::CentroidCount {
                expected: 8,
                actual: 7
            }
        );

        let points = vec![Point::default(); 9];
        assert!(CentroidSet::try_from(points.as_slice()).is_err());
    }

    #[test]
    fn centroid_set_distances() {
        let set = CentroidSet::new(std::array::from_fn(|i| Point::new(i as u8, 0)));
        let distances = set.distances(&Point::new(0, 1));
        assert_eq!(distances, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn mask_serializes_as_integer() {
        let json = serde_json::to_string(&Mask::new(192)).unwrap();
        assert_eq!(json, "192");
    }
}
