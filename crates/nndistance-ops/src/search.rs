use rayon::prelude::*;

use crate::points::PointSetView;

/// Squared Euclidean distance between two points.
///
/// Coordinate differences are taken in `f32`; squares and their sum are accumulated in
/// `f64` so that large coordinates do not lose the small differences that decide a match.
///
/// # Example
///
/// ```
/// use nndistance_ops::search::squared_distance;
///
/// let p = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
/// let q = [1.0, 2.0, 0.0, 0.0, 0.0, 2.0];
/// assert_eq!(squared_distance(&p, &q), 9.0);
/// ```
#[inline]
pub fn squared_distance(p: &[f32], q: &[f32]) -> f64 {
    p.iter()
        .zip(q.iter())
        .map(|(&a, &b)| {
            let d = (b - a) as f64;
            d * d
        })
        .sum()
}

/// Linear scan for the nearest candidate of `query`.
///
/// Returns the minimum squared distance and the index of the first candidate reaching
/// it, or `None` if there are no candidates. The incumbent is only replaced on a strict
/// improvement, so among exact ties the lowest index wins.
///
/// # Example
///
/// ```
/// use nndistance_ops::search::nearest_neighbor;
///
/// let query = [0.0f32; 6];
/// let candidates = [
///     [2.0, 0.0, 0.0, 0.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
///     [0.0, 0.0, -1.0, 0.0, 0.0, 0.0],
/// ];
/// let best = nearest_neighbor(&query, candidates.iter().map(|c| c.as_slice()));
/// assert_eq!(best, Some((1.0, 1)));
/// ```
pub fn nearest_neighbor<'a>(
    query: &[f32],
    candidates: impl Iterator<Item = &'a [f32]>,
) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for (k, candidate) in candidates.enumerate() {
        let d = squared_distance(query, candidate);
        match best {
            Some((best_d, _)) if d < best_d => best = Some((d, k)),
            Some(_) => {}
            None => best = Some((d, k)),
        }
    }
    best
}

/// Nearest neighbor of every point of `src` in `dst`, one batch after the other.
///
/// `dist` and `idx` are `[B, N]` row-major buffers for the `N` points of `src`.
pub fn search_serial(src: PointSetView, dst: PointSetView, dist: &mut [f32], idx: &mut [i32]) {
    let n = src.num_points();
    for b in 0..src.batch_size() {
        let range = b * n..(b + 1) * n;
        for ((query, d), i) in src
            .points(b)
            .zip(dist[range.clone()].iter_mut())
            .zip(idx[range].iter_mut())
        {
            if let Some((best, best_k)) = nearest_neighbor(query, dst.points(b)) {
                *d = best as f32;
                *i = best_k as i32;
            }
        }
    }
}

/// Same contract as [`search_serial`], with one work item per (batch, point) pair.
pub fn search_parallel(src: PointSetView, dst: PointSetView, dist: &mut [f32], idx: &mut [i32]) {
    let n = src.num_points();
    dist.par_iter_mut()
        .zip(idx.par_iter_mut())
        .enumerate()
        .for_each(|(flat, (d, i))| {
            let (b, j) = (flat / n, flat % n);
            if let Some((best, best_k)) = nearest_neighbor(src.point(b, j), dst.points(b)) {
                *d = best as f32;
                *i = best_k as i32;
            }
        });
}
