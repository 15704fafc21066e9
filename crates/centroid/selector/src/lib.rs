#![deny(unsafe_code)]
//! # centroid-selector
//!
//! Reference model for the nearest-centroid hardware block: given eight
//! centroids, a query point and an eligibility mask, report which eligible
//! centroids sit at minimum Manhattan distance from the query.
//!
//! ## Key Types
//!
//! - [`Point`] - byte-coordinate grid point
//! - [`CentroidSet`] - exactly eight candidates, index 0 on the mask MSB
//! - [`Mask`] - MSB-first eligibility bitset
//! - [`select`] / [`select_raw`] - the selection itself
//!
//! ```
//! use centroid_selector::{select, CentroidSet, Mask, Point};
//!
//! let mut points = [Point::new(255, 255); 8];
//! points[0] = Point::new(0, 0);
//! points[1] = Point::new(5, 5);
//! let nearest = select(Mask::new(0b1100_0000), &CentroidSet::new(points), Point::new(5, 5));
//! assert_eq!(nearest, Mask::new(0b0100_0000));
//! ```

pub mod error;
pub mod select;
pub mod types;

pub use error::{SelectorError, SelectorResult};
pub use select::{select, select_raw};
pub use types::{CentroidSet, Mask, Point, CENTROID_COUNT, MAX_DISTANCE, UNSEEN_DISTANCE};
