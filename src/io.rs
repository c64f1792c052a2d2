//! External collaborators: GeoTIFF terrain loading and CSV point tables.

use std::fs::File;
use std::io::{BufReader, BufWriter};

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};

/// Read the georeferencing from the GeoTIFF tags of an open TIFF decoder
/// (ModelPixelScaleTag 33550 + ModelTiepointTag 33922).
///
/// Returns (res_x, res_y, origin_x, origin_y). Missing tags fall back to a
/// 1.0 m resolution and a (0, 0) origin, with a warning.
fn geotiff_extent_from_decoder<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> (f64, f64, f64, f64) {
    let mut res_x = 1.0_f64;
    let mut res_y = 1.0_f64;
    let mut origin_x = 0.0_f64;
    let mut origin_y = 0.0_f64;
    let mut found_scale = false;
    let mut found_tiepoint = false;

    if let Ok(Some(scale_val)) = decoder.find_tag(Tag::ModelPixelScaleTag) {
        if let Ok(scale) = scale_val.into_f64_vec() {
            if scale.len() >= 2 {
                res_x = scale[0];
                res_y = scale[1];
                found_scale = true;
            }
        }
    }
    if let Ok(Some(tie_val)) = decoder.find_tag(Tag::ModelTiepointTag) {
        if let Ok(tie) = tie_val.into_f64_vec() {
            if tie.len() >= 6 {
                origin_x = tie[3];
                origin_y = tie[4];
                found_tiepoint = true;
            }
        }
    }

    if !found_scale {
        eprintln!("⚠ Tag ModelPixelScale (33550) absent — résolution par défaut 1.0m");
    }
    if !found_tiepoint {
        eprintln!("⚠ Tag ModelTiepoint (33922) absent — origine par défaut (0, 0)");
    }

    (res_x, res_y, origin_x, origin_y)
}

/// Load a GeoTIFF terrain model as a [`Raster`] with its geotransform.
///
/// The first band is used when the file is multi-band (pixel-interleaved).
pub fn load_geotiff(path: &str) -> Result<Raster> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.into(),
        source,
    })?;
    let mut decoder = Decoder::new(BufReader::new(file))?;

    let (width, height) = decoder.dimensions()?;
    let ncol = width as usize;
    let nrow = height as usize;

    let (res_x, res_y, origin_x, origin_y) = geotiff_extent_from_decoder(&mut decoder);

    let result = decoder.read_image()?;
    let raw: Vec<f64> = match result {
        DecodingResult::F64(v) => v,
        DecodingResult::F32(v) => v.iter().map(|x| *x as f64).collect(),
        DecodingResult::U16(v) => v.iter().map(|x| *x as f64).collect(),
        DecodingResult::U8(v) => v.iter().map(|x| *x as f64).collect(),
        _ => return Err(Error::UnsupportedPixelFormat(path.into())),
    };

    let total_pixels = nrow * ncol;
    if total_pixels == 0 || raw.len() < total_pixels {
        return Err(Error::UnsupportedPixelFormat(path.into()));
    }
    let n_bands = raw.len() / total_pixels;
    let band_data: Vec<f64> = if n_bands > 1 {
        eprintln!("⚠ {n_bands} bandes dans '{path}' — bande 0 utilisée");
        (0..total_pixels).map(|px| raw[px * n_bands]).collect()
    } else {
        raw
    };

    // North-up: y decreases with increasing row
    let transform = GeoTransform::new(origin_x, origin_y, res_x, -res_y);
    Ok(Raster::from_vec(nrow, ncol, band_data).with_transform(transform))
}

/// Read a headered CSV into a [`PointCloud`], parsing the three named
/// coordinate columns as `f64`. All original columns are kept verbatim.
pub fn read_point_cloud(path: &str, x_col: &str, y_col: &str, z_col: &str) -> Result<PointCloud> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.into(),
        source,
    })?;
    let mut rdr = csv::Reader::from_reader(BufReader::new(file));

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let find = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.into()))
    };
    let ix = find(x_col)?;
    let iy = find(y_col)?;
    let iz = find(z_col)?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut x: Vec<f64> = Vec::new();
    let mut y: Vec<f64> = Vec::new();
    let mut z: Vec<f64> = Vec::new();

    for record in rdr.records() {
        let rec = record?;
        let line = rec.position().map(|p| p.line()).unwrap_or(0);
        let parse = |col: usize, name: &str| -> Result<f64> {
            let field = rec.get(col).unwrap_or("");
            field.trim().parse::<f64>().map_err(|_| Error::NonNumeric {
                column: name.into(),
                value: field.into(),
                line,
            })
        };
        x.push(parse(ix, x_col)?);
        y.push(parse(iy, y_col)?);
        z.push(parse(iz, z_col)?);
        rows.push(rec.iter().map(str::to_string).collect());
    }

    Ok(PointCloud {
        headers,
        rows,
        x,
        y,
        z,
    })
}

/// Write the sliced band to CSV: the original columns of each retained row,
/// plus `alturas` (normalized height) and `label` (cluster label).
///
/// `heights` is indexed by full-table row; `band` holds the retained row
/// indices in input order; `labels` is parallel to `band`.
pub fn write_band_csv(
    path: &str,
    cloud: &PointCloud,
    heights: &[f64],
    band: &[usize],
    labels: &[i32],
) -> Result<()> {
    debug_assert_eq!(heights.len(), cloud.len());
    debug_assert_eq!(labels.len(), band.len());

    let file = File::create(path).map_err(|source| Error::Create {
        path: path.into(),
        source,
    })?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));

    let header = cloud
        .headers
        .iter()
        .map(String::as_str)
        .chain(["alturas", "label"]);
    wtr.write_record(header)?;

    for (k, &i) in band.iter().enumerate() {
        let alturas = heights[i].to_string();
        let label = labels[k].to_string();
        let fields = cloud.rows[i]
            .iter()
            .map(String::as_str)
            .chain([alturas.as_str(), label.as_str()]);
        wtr.write_record(fields)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("lidartrunk_{}_{}.csv", std::process::id(), name))
    }

    fn write_input_csv(path: &std::path::Path) {
        let mut f = File::create(path).unwrap();
        writeln!(f, "X,Y,ELEV,intensity").unwrap();
        writeln!(f, "0.5,0.5,101.5,12").unwrap();
        writeln!(f, "1.5,0.5,101.5,34").unwrap();
        writeln!(f, "9.5,9.5,105.0,56").unwrap();
    }

    #[test]
    fn test_read_point_cloud() {
        let path = temp_path("read");
        write_input_csv(&path);

        let cloud = read_point_cloud(path.to_str().unwrap(), "X", "Y", "ELEV").unwrap();
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.headers, vec!["X", "Y", "ELEV", "intensity"]);
        assert_eq!(cloud.x, vec![0.5, 1.5, 9.5]);
        assert_eq!(cloud.z[2], 105.0);
        // Extra columns survive verbatim
        assert_eq!(cloud.rows[1][3], "34");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_column() {
        let path = temp_path("missing_col");
        write_input_csv(&path);

        let err = read_point_cloud(path.to_str().unwrap(), "X", "Y", "Z").unwrap_err();
        match err {
            Error::MissingColumn(name) => assert_eq!(name, "Z"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_non_numeric_value() {
        let path = temp_path("non_numeric");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "X,Y,ELEV").unwrap();
        writeln!(f, "1.0,2.0,3.0").unwrap();
        writeln!(f, "1.0,abc,3.0").unwrap();
        drop(f);

        let err = read_point_cloud(path.to_str().unwrap(), "X", "Y", "ELEV").unwrap_err();
        match err {
            Error::NonNumeric { column, value, line } => {
                assert_eq!(column, "Y");
                assert_eq!(value, "abc");
                assert_eq!(line, 3);
            }
            other => panic!("expected NonNumeric, got {other:?}"),
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_band_csv_round_trip() {
        let in_path = temp_path("rt_in");
        let out_path = temp_path("rt_out");
        write_input_csv(&in_path);

        let cloud = read_point_cloud(in_path.to_str().unwrap(), "X", "Y", "ELEV").unwrap();
        let heights = vec![1.5, 1.5, 5.0];
        let band = vec![0, 1];
        let labels = vec![0, -1];
        write_band_csv(out_path.to_str().unwrap(), &cloud, &heights, &band, &labels).unwrap();

        let out = read_point_cloud(out_path.to_str().unwrap(), "X", "Y", "ELEV").unwrap();
        assert_eq!(out.len(), band.len());
        assert_eq!(
            out.headers,
            vec!["X", "Y", "ELEV", "intensity", "alturas", "label"]
        );
        assert_eq!(out.rows[0][4], "1.5");
        assert_eq!(out.rows[0][5], "0");
        assert_eq!(out.rows[1][5], "-1");

        std::fs::remove_file(&in_path).ok();
        std::fs::remove_file(&out_path).ok();
    }
}
