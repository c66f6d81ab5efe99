use rayon::prelude::*;

use crate::points::{PointGradMut, PointSetView, POINT_DIM};

/// Everything the backward pass reads.
///
/// All slices are flat row-major `[B, N]` (for the `1` side) or `[B, M]` (for the `2`
/// side) buffers whose shapes and index ranges have already been validated.
#[derive(Debug, Clone, Copy)]
pub struct ScatterInputs<'a> {
    /// First point set, `[B, N, 6]`.
    pub xyz1: PointSetView<'a>,
    /// Second point set, `[B, M, 6]`.
    pub xyz2: PointSetView<'a>,
    /// Upstream gradient of `dist1`, `[B, N]`.
    pub grad_dist1: &'a [f32],
    /// Nearest neighbor in `xyz2` of every point of `xyz1`, `[B, N]`.
    pub idx1: &'a [i32],
    /// Upstream gradient of `dist2`, `[B, M]`.
    pub grad_dist2: &'a [f32],
    /// Nearest neighbor in `xyz1` of every point of `xyz2`, `[B, M]`.
    pub idx2: &'a [i32],
}

/// Accumulates both directions into zero-filled gradient buffers, one pair at a time.
///
/// For a pair `(j, k = idx[j])` with upstream gradient `g`, the source point receives
/// `2·g·(p_j − q_k)` and the matched point the exact negation.
pub fn scatter_serial(inputs: &ScatterInputs, grad_xyz1: &mut [f32], grad_xyz2: &mut [f32]) {
    let mut grad1 = PointGradMut::new(grad_xyz1, inputs.xyz1.num_points());
    let mut grad2 = PointGradMut::new(grad_xyz2, inputs.xyz2.num_points());

    accumulate_direction(
        inputs.xyz1,
        inputs.xyz2,
        inputs.grad_dist1,
        inputs.idx1,
        &mut grad1,
        &mut grad2,
    );
    accumulate_direction(
        inputs.xyz2,
        inputs.xyz1,
        inputs.grad_dist2,
        inputs.idx2,
        &mut grad2,
        &mut grad1,
    );
}

fn accumulate_direction(
    src: PointSetView,
    dst: PointSetView,
    grad_dist: &[f32],
    idx: &[i32],
    grad_src: &mut PointGradMut,
    grad_dst: &mut PointGradMut,
) {
    let n = src.num_points();
    for b in 0..src.batch_size() {
        for j in 0..n {
            let flat = b * n + j;
            let k = idx[flat] as usize;
            let g = grad_dist[flat] * 2.0;
            let p = src.point(b, j);
            let q = dst.point(b, k);

            grad_src
                .point_mut(b, j)
                .iter_mut()
                .zip(p.iter().zip(q.iter()))
                .for_each(|(acc, (&pc, &qc))| *acc += g * (pc - qc));
            grad_dst
                .point_mut(b, k)
                .iter_mut()
                .zip(p.iter().zip(q.iter()))
                .for_each(|(acc, (&pc, &qc))| *acc -= g * (pc - qc));
        }
    }
}

/// Same contract as [`scatter_serial`], with one work item per destination point.
///
/// Several source points may share a nearest neighbor, so instead of scattering the
/// kernel inverts each batch's assignment and lets the owner of every gradient slot
/// gather its contributions. No slot is written by more than one worker.
pub fn scatter_parallel(inputs: &ScatterInputs, grad_xyz1: &mut [f32], grad_xyz2: &mut [f32]) {
    if inputs.xyz1.num_points() == 0 || inputs.xyz2.num_points() == 0 {
        return;
    }

    rayon::join(
        || {
            gather_direction(
                inputs.xyz1,
                inputs.xyz2,
                (inputs.grad_dist1, inputs.idx1),
                (inputs.grad_dist2, inputs.idx2),
                grad_xyz1,
            )
        },
        || {
            gather_direction(
                inputs.xyz2,
                inputs.xyz1,
                (inputs.grad_dist2, inputs.idx2),
                (inputs.grad_dist1, inputs.idx1),
                grad_xyz2,
            )
        },
    );
}

/// Gradient of every point of `points`.
///
/// `own` holds the matches from `points` into `others`, `incoming` the matches from
/// `others` into `points`.
fn gather_direction(
    points: PointSetView,
    others: PointSetView,
    own: (&[f32], &[i32]),
    incoming: (&[f32], &[i32]),
    out: &mut [f32],
) {
    let (n, m) = (points.num_points(), others.num_points());
    let (grad_own, idx_own) = own;
    let (grad_incoming, idx_incoming) = incoming;

    out.par_chunks_mut(n * POINT_DIM)
        .enumerate()
        .for_each(|(b, out_batch)| {
            let inverse = InverseAssignment::new(&idx_incoming[b * m..(b + 1) * m], n);

            out_batch
                .par_chunks_mut(POINT_DIM)
                .enumerate()
                .for_each(|(j, slot)| {
                    let p = points.point(b, j);

                    let flat = b * n + j;
                    let g = grad_own[flat] * 2.0;
                    let q = others.point(b, idx_own[flat] as usize);
                    slot.iter_mut()
                        .zip(p.iter().zip(q.iter()))
                        .for_each(|(acc, (&pc, &qc))| *acc += g * (pc - qc));

                    for &k in inverse.sources(j) {
                        let g = grad_incoming[b * m + k] * 2.0;
                        let q = others.point(b, k);
                        slot.iter_mut()
                            .zip(p.iter().zip(q.iter()))
                            .for_each(|(acc, (&pc, &qc))| *acc -= g * (qc - pc));
                    }
                });
        });
}

/// The nearest-neighbor assignment of one batch, inverted.
///
/// For every destination point it lists the source points matched to it, in ascending
/// order, as a compressed row layout (`offsets` has one more entry than destinations).
#[derive(Debug, Clone, PartialEq)]
pub struct InverseAssignment {
    offsets: Vec<usize>,
    sources: Vec<usize>,
}

impl InverseAssignment {
    /// Inverts `idx`, whose entries must lie in `[0, num_destinations)`.
    pub fn new(idx: &[i32], num_destinations: usize) -> Self {
        let mut offsets = vec![0usize; num_destinations + 1];
        for &k in idx {
            offsets[k as usize + 1] += 1;
        }
        for d in 0..num_destinations {
            offsets[d + 1] += offsets[d];
        }

        let mut cursor = offsets.clone();
        let mut sources = vec![0usize; idx.len()];
        for (src, &k) in idx.iter().enumerate() {
            let slot = &mut cursor[k as usize];
            sources[*slot] = src;
            *slot += 1;
        }

        Self { offsets, sources }
    }

    /// Source points matched to `destination`.
    #[inline]
    pub fn sources(&self, destination: usize) -> &[usize] {
        &self.sources[self.offsets[destination]..self.offsets[destination + 1]]
    }
}
