//! Density-based clustering (DBSCAN) of the band's 2D footprint.
//!
//! Each trunk shows up as a dense disc of points in the (x, y) plane; DBSCAN
//! groups those discs without knowing the trunk count in advance and labels
//! stragglers as noise.

use kdtree::distance::squared_euclidean;
use kdtree::KdTree;

use crate::error::{Error, Result};

/// Label assigned to points that belong to no dense cluster.
pub const NOISE: i32 = -1;

/// Not yet visited by the scan. Never present in the output.
const UNVISITED: i32 = -2;

/// Result of a clustering run.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// One label per input point, in input order. Cluster labels start at 0;
    /// [`NOISE`] marks unclustered points.
    pub labels: Vec<i32>,
    /// Number of distinct clusters found (noise excluded).
    pub clusters: usize,
}

/// Cluster 2D points with DBSCAN.
///
/// A point is a core point when at least `min_points` points (itself
/// included) lie within Euclidean distance `eps`. Clusters grow from core
/// points through their neighborhoods; non-core points within `eps` of a
/// core point join that core point's cluster; the rest are labeled
/// [`NOISE`].
///
/// Points are scanned in input order and neighbor sets are processed in
/// index order, so repeated runs over the same input produce identical
/// labels.
pub fn dbscan(points: &[[f64; 2]], eps: f64, min_points: usize) -> Result<Clustering> {
    if !(eps > 0.0) {
        return Err(Error::InvalidParameter {
            name: "eps",
            value: eps.to_string(),
            reason: "neighborhood radius must be positive",
        });
    }
    if min_points == 0 {
        return Err(Error::InvalidParameter {
            name: "min_points",
            value: "0".into(),
            reason: "a cluster needs at least one point",
        });
    }

    let n = points.len();
    let mut labels = vec![UNVISITED; n];
    if n == 0 {
        return Ok(Clustering {
            labels,
            clusters: 0,
        });
    }

    let mut tree: KdTree<f64, usize, [f64; 2]> = KdTree::with_capacity(2, 64);
    for (i, p) in points.iter().enumerate() {
        tree.add(*p, i)
            .map_err(|e| Error::Cluster(format!("kd-tree insert failed at point {i}: {e:?}")))?;
    }

    let eps_sq = eps * eps;
    let neighbors_of = |i: usize| -> Result<Vec<usize>> {
        let found = tree
            .within(&points[i], eps_sq, &squared_euclidean)
            .map_err(|e| Error::Cluster(format!("kd-tree query failed at point {i}: {e:?}")))?;
        let mut idx: Vec<usize> = found.into_iter().map(|(_, &j)| j).collect();
        idx.sort_unstable();
        Ok(idx)
    };

    let mut cluster_id: i32 = 0;
    let mut queue: Vec<usize> = Vec::new();

    for i in 0..n {
        if labels[i] != UNVISITED {
            continue;
        }
        let seed = neighbors_of(i)?;
        if seed.len() < min_points {
            labels[i] = NOISE;
            continue;
        }

        // New cluster: expand from the seed neighborhood
        labels[i] = cluster_id;
        queue.clear();
        queue.extend(seed);
        let mut head = 0;
        while head < queue.len() {
            let j = queue[head];
            head += 1;
            if labels[j] == NOISE {
                // Border point: reachable from a core point, but not core itself
                labels[j] = cluster_id;
                continue;
            }
            if labels[j] != UNVISITED {
                continue;
            }
            labels[j] = cluster_id;
            let nb = neighbors_of(j)?;
            if nb.len() >= min_points {
                queue.extend(nb);
            }
        }
        cluster_id += 1;
    }

    Ok(Clustering {
        labels,
        clusters: cluster_id as usize,
    })
}
