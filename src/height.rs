//! Height normalization: point elevation minus terrain elevation at the
//! point's projected raster cell.

use crate::error::{Error, Result};
use crate::raster::Raster;

/// Compute the height above ground of every point.
///
/// `x`, `y`, `z` are parallel columns of equal length; `dtm` supplies the
/// terrain grid and its geotransform. Returns one height per input point,
/// in input order: `z[i] - dtm[cell(x[i], y[i])]`.
///
/// This loop runs once per input point (millions for a dense scan), so the
/// body is a handful of arithmetic operations with no allocation beyond the
/// preallocated output.
///
/// # Errors
/// - [`Error::LengthMismatch`] if the columns differ in length.
/// - [`Error::InvalidParameter`] if the raster has a zero pixel size.
/// - [`Error::OutsideGrid`] if any point projects outside the terrain grid;
///   the whole run fails rather than skipping or clamping the point.
pub fn normalize_heights(x: &[f64], y: &[f64], z: &[f64], dtm: &Raster) -> Result<Vec<f64>> {
    if x.len() != y.len() || x.len() != z.len() {
        return Err(Error::LengthMismatch {
            x: x.len(),
            y: y.len(),
            z: z.len(),
        });
    }
    let gt = dtm.transform;
    if gt.pixel_width == 0.0 {
        return Err(Error::InvalidParameter {
            name: "pixel_width",
            value: "0".into(),
            reason: "terrain raster has no horizontal resolution",
        });
    }
    if gt.pixel_height == 0.0 {
        return Err(Error::InvalidParameter {
            name: "pixel_height",
            value: "0".into(),
            reason: "terrain raster has no vertical resolution",
        });
    }

    let nrow_f = dtm.nrow as f64;
    let ncol_f = dtm.ncol as f64;
    let ncol = dtm.ncol;
    let grid = &dtm.data;

    let mut heights = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        let (row, col) = gt.world_to_cell(x[i], y[i]);
        // Negated form so NaN coordinates also land in the error branch.
        if !(row >= 0.0 && col >= 0.0 && row < nrow_f && col < ncol_f) {
            return Err(Error::OutsideGrid {
                index: i,
                row,
                col,
                nrow: dtm.nrow,
                ncol: dtm.ncol,
            });
        }
        heights.push(z[i] - grid[row as usize * ncol + col as usize]);
    }
    Ok(heights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    fn flat_terrain(elev: f64) -> Raster {
        Raster::new(10, 10, elev).with_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0))
    }

    #[test]
    fn test_flat_terrain_heights() {
        let dtm = flat_terrain(100.0);
        let x = [0.5, 3.2, 9.5, 5.0];
        let y = [0.5, 7.8, 9.5, 5.0];
        let z = [101.5, 112.0, 99.0, 100.0];

        let h = normalize_heights(&x, &y, &z, &dtm).unwrap();
        assert_eq!(h.len(), 4);
        for (hi, zi) in h.iter().zip(z.iter()) {
            assert!((hi - (zi - 100.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cell_lookup_on_sloped_terrain() {
        // 2x3 grid, one distinct value per cell
        let dtm = Raster::from_vec(2, 3, vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0])
            .with_transform(GeoTransform::new(0.0, 2.0, 1.0, -1.0));

        // (1.5, 0.5) sits on the center of cell (row 1, col 1) = 50.0
        let h = normalize_heights(&[1.5], &[0.5], &[100.0], &dtm).unwrap();
        assert_eq!(h[0], 50.0);

        // (2.5, 1.5) sits on cell (row 0, col 2) = 30.0
        let h = normalize_heights(&[2.5], &[1.5], &[31.0], &dtm).unwrap();
        assert_eq!(h[0], 1.0);
    }

    #[test]
    fn test_out_of_grid_fails_run() {
        let dtm = flat_terrain(100.0);
        let err = normalize_heights(&[0.5, 25.0], &[0.5, 0.5], &[101.0, 101.0], &dtm)
            .unwrap_err();
        match err {
            Error::OutsideGrid { index, .. } => assert_eq!(index, 1),
            other => panic!("expected OutsideGrid, got {other:?}"),
        }
    }

    #[test]
    fn test_length_mismatch() {
        let dtm = flat_terrain(0.0);
        let err = normalize_heights(&[1.0, 2.0], &[1.0], &[1.0, 2.0], &dtm).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_empty_input() {
        let dtm = flat_terrain(0.0);
        let h = normalize_heights(&[], &[], &[], &dtm).unwrap();
        assert!(h.is_empty());
    }
}
