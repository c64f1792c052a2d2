//! # lidartrunk — tree trunk detection from a DTM and a LiDAR point cloud
//!
//! Batch pipeline over an in-memory point set:
//! 1. **Height normalization** (`normalize_heights`): project each point onto
//!    the terrain raster and subtract the ground elevation.
//! 2. **Band slice** (`band_indices`): keep the points crossing the trunk
//!    band (default 1.39–1.61 m above ground).
//! 3. **Clustering** (`dbscan`): density-cluster the band's 2D footprint;
//!    each cluster is one trunk, label −1 is noise.
//!
//! Inputs are a GeoTIFF terrain model and a CSV export with X, Y, ELEV
//! columns; the output CSV is the sliced band with `alturas` and `label`
//! columns appended.

pub mod cloud;
pub mod cluster;
pub mod error;
pub mod height;
pub mod io;
pub mod raster;

pub use cloud::{band_indices, PointCloud};
pub use cluster::{dbscan, Clustering, NOISE};
pub use error::{Error, Result};
pub use height::normalize_heights;
pub use raster::{GeoTransform, Raster};
