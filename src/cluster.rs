//! Centroid-based clustering of encoded events.
//!
//! K-means over the 4-D cyclical feature space with Euclidean
//! distance. The engine runs several random initializations and keeps
//! the partition with the lowest within-cluster squared distance, so
//! a single unlucky seeding does not decide the result. Everything is
//! driven by an explicit seed; the same input and seed always produce
//! the same assignment.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::event::EncodedEvent;

/// Parameters for the cluster engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KmeansConfig {
    /// Target cluster count K.
    pub clusters: usize,
    /// Number of random centroid initializations; best run wins.
    pub n_init: usize,
    /// Hard cap on Lloyd iterations per initialization.
    pub max_iter: usize,
    /// Convergence threshold on centroid movement.
    pub tolerance: f64,
    /// Seed for the initialization search.
    pub seed: u64,
}

impl Default for KmeansConfig {
    fn default() -> Self {
        Self {
            clusters: 50,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// Result of one clustering run.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Cluster id in `[0, clusters)` per event, in input order.
    pub assignments: Vec<usize>,
    /// Final centroid positions in feature space.
    pub centroids: Vec<[f64; 4]>,
    /// Total within-cluster squared distance of the winning run.
    pub inertia: f64,
}

/// Partitions events into `config.clusters` clusters.
///
/// # Errors
///
/// Returns [`Error::Config`] if K is zero or exceeds the number of
/// distinct feature points, and [`Error::Data`] for an empty input.
pub fn cluster_events(events: &[EncodedEvent], config: &KmeansConfig) -> Result<Clustering> {
    if events.is_empty() {
        return Err(Error::data("cannot cluster an empty event list"));
    }
    if config.clusters < 1 {
        return Err(Error::config("cluster count must be at least 1"));
    }

    let points: Vec<[f64; 4]> = events.iter().map(EncodedEvent::features).collect();

    let distinct = distinct_points(&points);
    if config.clusters > distinct {
        return Err(Error::config(format!(
            "cluster count {} exceeds the {} distinct feature points",
            config.clusters, distinct
        )));
    }

    // Seeds are drawn sequentially so the parallel search stays
    // reproducible; ties on inertia go to the lowest run index.
    let mut master = StdRng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.n_init.max(1)).map(|_| master.gen()).collect();

    let best = seeds
        .par_iter()
        .enumerate()
        .map(|(run, &seed)| (run, lloyd(&points, config, seed)))
        .min_by(|(run_a, a), (run_b, b)| {
            a.inertia
                .partial_cmp(&b.inertia)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(run_a.cmp(run_b))
        })
        .map(|(_, clustering)| clustering)
        .ok_or_else(|| Error::config("at least one initialization is required"))?;

    debug!(
        "K-means: {} events, k={}, {} inits, best inertia {:.4}",
        events.len(),
        config.clusters,
        seeds.len(),
        best.inertia
    );
    Ok(best)
}

/// Counts distinct feature points by exact bit pattern.
fn distinct_points(points: &[[f64; 4]]) -> usize {
    points
        .iter()
        .map(|p| [p[0].to_bits(), p[1].to_bits(), p[2].to_bits(), p[3].to_bits()])
        .collect::<HashSet<_>>()
        .len()
}

/// One seeded Lloyd run: random distinct starting points, iterate
/// assign/update until centroids settle or the iteration cap hits.
fn lloyd(points: &[[f64; 4]], config: &KmeansConfig, seed: u64) -> Clustering {
    let mut rng = StdRng::seed_from_u64(seed);
    let k = config.clusters;

    let mut centroids: Vec<[f64; 4]> = rand::seq::index::sample(&mut rng, points.len(), k)
        .into_iter()
        .map(|i| points[i])
        .collect();
    let mut assignments = vec![0usize; points.len()];

    for iter in 0..config.max_iter {
        for (i, point) in points.iter().enumerate() {
            assignments[i] = nearest_centroid(point, &centroids);
        }

        let mut sums = vec![[0.0f64; 4]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in points.iter().zip(&assignments) {
            for d in 0..4 {
                sums[cluster][d] += point[d];
            }
            counts[cluster] += 1;
        }

        let mut movement: f64 = 0.0;
        for (cluster, count) in counts.iter().enumerate() {
            if *count == 0 {
                // Reseed a starved cluster from the point furthest
                // from its current centroid.
                let far = furthest_point(points, &assignments, &centroids);
                centroids[cluster] = points[far];
                movement = f64::INFINITY;
                continue;
            }
            let mut next = [0.0f64; 4];
            for d in 0..4 {
                next[d] = sums[cluster][d] / *count as f64;
            }
            movement = movement.max(distance_sq(&centroids[cluster], &next).sqrt());
            centroids[cluster] = next;
        }

        if movement < config.tolerance {
            trace!("Lloyd run converged after {} iterations", iter + 1);
            break;
        }
    }

    // Final assignment against the settled centroids.
    for (i, point) in points.iter().enumerate() {
        assignments[i] = nearest_centroid(point, &centroids);
    }
    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(p, &c)| distance_sq(p, &centroids[c]))
        .sum();

    Clustering {
        assignments,
        centroids,
        inertia,
    }
}

fn nearest_centroid(point: &[f64; 4], centroids: &[[f64; 4]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (cluster, centroid) in centroids.iter().enumerate() {
        let dist = distance_sq(point, centroid);
        if dist < best_dist {
            best = cluster;
            best_dist = dist;
        }
    }
    best
}

fn furthest_point(points: &[[f64; 4]], assignments: &[usize], centroids: &[[f64; 4]]) -> usize {
    let mut far = 0;
    let mut far_dist = -1.0f64;
    for (i, point) in points.iter().enumerate() {
        let dist = distance_sq(point, &centroids[assignments[i]]);
        if dist > far_dist {
            far = i;
            far_dist = dist;
        }
    }
    far
}

fn distance_sq(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Mean silhouette coefficient over all points in the 4-D feature
/// space: per point, `(b − a) / max(a, b)` where `a` is the mean
/// intra-cluster distance and `b` the mean distance to the nearest
/// other cluster. Range [-1, 1]; higher means better separation.
/// Singleton clusters contribute 0 for their point.
///
/// # Errors
///
/// Returns [`Error::Data`] when fewer than 2 clusters have members
/// (the coefficient is undefined) or when the label list does not
/// match the event list.
pub fn silhouette_score(events: &[EncodedEvent], assignments: &[usize]) -> Result<f64> {
    if events.len() != assignments.len() {
        return Err(Error::data(format!(
            "label count {} does not match event count {}",
            assignments.len(),
            events.len()
        )));
    }

    let k = assignments.iter().max().map_or(0, |m| m + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
    for (i, &cluster) in assignments.iter().enumerate() {
        members[cluster].push(i);
    }
    let populated: Vec<&Vec<usize>> = members.iter().filter(|m| !m.is_empty()).collect();
    if populated.len() < 2 {
        return Err(Error::data(
            "silhouette is undefined with fewer than 2 non-empty clusters",
        ));
    }

    let points: Vec<[f64; 4]> = events.iter().map(EncodedEvent::features).collect();

    let total: f64 = (0..points.len())
        .into_par_iter()
        .map(|i| {
            let own = assignments[i];
            if members[own].len() < 2 {
                return 0.0;
            }

            let a = mean_distance(&points, i, &members[own]);
            let b = members
                .iter()
                .enumerate()
                .filter(|(cluster, m)| *cluster != own && !m.is_empty())
                .map(|(_, m)| mean_distance(&points, i, m))
                .fold(f64::INFINITY, f64::min);

            (b - a) / a.max(b)
        })
        .sum();

    Ok(total / points.len() as f64)
}

/// Mean distance from `points[i]` to the given member set, excluding
/// the point itself.
fn mean_distance(points: &[[f64; 4]], i: usize, members: &[usize]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &j in members {
        if j == i {
            continue;
        }
        sum += distance_sq(&points[i], &points[j]).sqrt();
        n += 1;
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
