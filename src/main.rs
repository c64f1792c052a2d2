//! Détection de troncs d'arbres à partir d'un MNT GeoTIFF et d'un nuage de
//! points LiDAR exporté en CSV.
//!
//! Usage :
//!   cargo run --release -- MNT.tif points.csv
//!   cargo run --release -- MNT.tif points.csv --hmin 1.2 --hmax 1.4 --eps 1.0
//!
//! Produit :
//!   troncs_detectes.csv — colonnes d'origine + alturas, label

use std::collections::HashMap;

use clap::Parser;

use lidartrunk::{band_indices, dbscan, io, normalize_heights, Error, NOISE};

// ==========================================================================
// CLI (clap)
// ==========================================================================

#[derive(Parser, Debug)]
#[command(
    name = "lidartrunk",
    about = "Détection de troncs sur MNT GeoTIFF + nuage de points CSV",
    after_help = "Produit : troncs_detectes.csv — colonnes d'origine + alturas, label"
)]
struct Cli {
    /// Fichier MNT (DTM) GeoTIFF
    #[arg(value_name = "MNT.tif")]
    dtm_path: String,

    /// Fichier CSV des points (colonnes X, Y, ELEV par défaut)
    #[arg(value_name = "points.csv")]
    csv_path: String,

    /// Borne basse de la bande de coupe (m au-dessus du sol, exclusive)
    #[arg(long, default_value_t = 1.39)]
    hmin: f64,

    /// Borne haute de la bande de coupe (m au-dessus du sol, exclusive)
    #[arg(long, default_value_t = 1.61)]
    hmax: f64,

    /// Rayon de voisinage DBSCAN (m)
    #[arg(long, default_value_t = 1.5)]
    eps: f64,

    /// Nombre minimal de points par voisinage DBSCAN
    #[arg(long, default_value_t = 3)]
    min_points: usize,

    /// Nom de la colonne X
    #[arg(long, default_value = "X")]
    x_col: String,

    /// Nom de la colonne Y
    #[arg(long, default_value = "Y")]
    y_col: String,

    /// Nom de la colonne d'élévation
    #[arg(long, default_value = "ELEV")]
    z_col: String,

    /// Fichier CSV de sortie
    #[arg(long, short, default_value = "troncs_detectes.csv")]
    output: String,
}

// ==========================================================================
// Main
// ==========================================================================

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Erreur : {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    if cli.hmin >= cli.hmax {
        return Err(Error::InvalidParameter {
            name: "hmin/hmax",
            value: format!("{}/{}", cli.hmin, cli.hmax),
            reason: "la borne basse doit être inférieure à la borne haute",
        });
    }

    println!("══════════════════════════════════════════════════════════");
    println!("  lidartrunk — Détection de troncs (MNT + nuage de points)");
    println!("══════════════════════════════════════════════════════════\n");

    println!("1. Chargement du MNT '{}'...", cli.dtm_path);
    let dtm = io::load_geotiff(&cli.dtm_path)?;
    println!(
        "   {} × {} pixels, résolution ({}, {}), origine ({:.2}, {:.2})",
        dtm.ncol,
        dtm.nrow,
        dtm.transform.pixel_width,
        dtm.transform.pixel_height,
        dtm.transform.origin_x,
        dtm.transform.origin_y
    );

    println!("2. Lecture des points '{}'...", cli.csv_path);
    let cloud = io::read_point_cloud(&cli.csv_path, &cli.x_col, &cli.y_col, &cli.z_col)?;
    println!("   {} points lus", cloud.len());

    println!("3. Paramètres :");
    println!(
        "   bande ({}, {}) m   eps={} m   min_points={}",
        cli.hmin, cli.hmax, cli.eps, cli.min_points
    );
    println!();

    println!("4. Normalisation des hauteurs...");
    let t0 = std::time::Instant::now();
    let heights = normalize_heights(&cloud.x, &cloud.y, &cloud.z, &dtm)?;
    println!("   ✓ {} hauteurs en {:.2}s", heights.len(), t0.elapsed().as_secs_f64());

    println!("5. Coupe transversale ({} < h < {})...", cli.hmin, cli.hmax);
    let band = band_indices(&heights, cli.hmin, cli.hmax);
    println!("   {} points dans la bande", band.len());

    println!("6. Clustering DBSCAN...");
    let footprint: Vec<[f64; 2]> = band.iter().map(|&i| [cloud.x[i], cloud.y[i]]).collect();
    let t0 = std::time::Instant::now();
    let clustering = dbscan(&footprint, cli.eps, cli.min_points)?;
    println!(
        "   ✓ {} troncs trouvés en {:.2}s\n",
        clustering.clusters,
        t0.elapsed().as_secs_f64()
    );

    // Statistiques par tronc : nombre de points et centre
    if clustering.clusters > 0 {
        let mut stats: HashMap<i32, (usize, f64, f64)> = HashMap::new();
        for (k, &i) in band.iter().enumerate() {
            let label = clustering.labels[k];
            if label == NOISE {
                continue;
            }
            let e = stats.entry(label).or_insert((0, 0.0, 0.0));
            e.0 += 1;
            e.1 += cloud.x[i];
            e.2 += cloud.y[i];
        }
        let noise = clustering.labels.iter().filter(|&&l| l == NOISE).count();

        let mut rows: Vec<(i32, usize, f64, f64)> = stats
            .into_iter()
            .map(|(label, (n, sx, sy))| (label, n, sx / n as f64, sy / n as f64))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        println!("7. Statistiques :");
        println!("   Points bruités : {}", noise);
        println!("\n   Top 10 troncs par nombre de points :");
        println!(
            "   {:>5}  {:>7}  {:>12}  {:>12}",
            "Tronc", "Points", "X centre", "Y centre"
        );
        println!("   {}", "─".repeat(44));
        for (label, n, cx, cy) in rows.iter().take(10) {
            println!("   {:>5}  {:>7}  {:>12.2}  {:>12.2}", label, n, cx, cy);
        }
        println!();
    }

    println!("8. Export → '{}'", cli.output);
    io::write_band_csv(&cli.output, &cloud, &heights, &band, &clustering.labels)?;
    println!("   {} lignes écrites.", band.len());

    println!("\n══════════════════════════════════════════════════════════");
    println!(
        "  ✓ Terminé — {} troncs sur {} points de bande",
        clustering.clusters,
        band.len()
    );
    println!("══════════════════════════════════════════════════════════");
    Ok(())
}
