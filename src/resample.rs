use nalgebra::Vector3;

use crate::config::Config;
use crate::error::Result;
use crate::frame::{local_frame, transform_point};
use crate::segment::Patch;

/// One patch's local parameterization: its seed pose, the grid geometry
/// needed to invert cell coordinates, the per-cell mean height (zero where
/// unmasked), and the ascending mask of occupied cells.
#[derive(Clone, Debug)]
pub struct ResampledPatch {
    pub seed_position: Vector3<f64>,
    pub seed_normal: Vector3<f64>,
    pub span: f64,
    pub bias: (f64, f64),
    /// Length `n_bins * n_bins`, row-major (`y * n_bins + x`), zero at
    /// unmasked cells.
    pub heights: Vec<f64>,
    /// Ascending grid-cell indices that received at least one vertex.
    pub mask: Vec<u32>,
    /// Parallel to `patch.members`; `None` for the seed (index 0), `Some`
    /// grid cell for every other member.
    pub member_grid: Vec<Option<u32>>,
}

/// Build the local tangent frame at the patch seed, project every member
/// into it, snap to the `n_bins x n_bins` grid, and average heights per
/// cell. See spec §4.3.
pub fn resample_patch(
    positions: &[Vector3<f64>],
    normals: &[Vector3<f64>],
    patch: &Patch,
    n_bins: usize,
) -> Result<ResampledPatch> {
    let seed = patch.seed();
    let seed_position = positions[seed as usize];
    let seed_normal = normals[seed as usize];
    let transform = local_frame(seed_position, seed_normal);

    let mut locals = Vec::with_capacity(patch.members.len() - 1);
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for &v in &patch.members[1..] {
        let local = transform_point(&transform, positions[v as usize]);
        min_x = min_x.min(local.x);
        max_x = max_x.max(local.x);
        min_y = min_y.min(local.y);
        max_y = max_y.max(local.y);
        locals.push(local);
    }

    // A patch with no members besides its seed (every neighbor failed the
    // normal-cone test, spec scenario C) has zero extent: `locals` is
    // empty, so the loop below never runs and this resolves to an empty
    // mask and `span = 0` rather than an error, matching the original
    // compressor's `resample()`.
    let bias = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    let n = n_bins as f64;
    let reach = (max_x - min_x).max(max_y - min_y) * n / (n - 1.0);
    let span = reach / n;

    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); n_bins * n_bins];
    let mut member_grid = Vec::with_capacity(patch.members.len());
    member_grid.push(None);

    for local in &locals {
        let x = local.x - bias.0;
        let y = local.y - bias.1;
        let x_grid = cell_index(x, reach, span, n_bins);
        let y_grid = cell_index(y, reach, span, n_bins);
        let cell = (y_grid * n_bins + x_grid) as u32;
        buckets[cell as usize].push(local.z);
        member_grid.push(Some(cell));
    }

    let mut heights = vec![0.0f64; n_bins * n_bins];
    let mut mask = Vec::new();
    for (cell, bucket) in buckets.iter().enumerate() {
        if !bucket.is_empty() {
            heights[cell] = bucket.iter().sum::<f64>() / bucket.len() as f64;
            mask.push(cell as u32);
        }
    }

    Ok(ResampledPatch {
        seed_position,
        seed_normal,
        span,
        bias,
        heights,
        mask,
        member_grid,
    })
}

/// `floor` with clamp-to-`n_bins - 1`, per the spec's resolution of the
/// strict-inequality boundary question: a vertex landing exactly on the
/// extreme edge of the patch extent is clamped rather than rejected.
fn cell_index(offset_from_bias: f64, reach: f64, span: f64, n_bins: usize) -> usize {
    let base = -reach / 2.0;
    let idx = ((offset_from_bias - base) / span).floor();
    let idx = idx.max(0.0) as usize;
    idx.min(n_bins - 1)
}

/// Resample every patch independently. Patches share no state, so with the
/// `parallel` feature enabled this runs over `rayon`'s `par_iter` instead
/// of a plain iterator; either way the result stays indexed by patch id,
/// matching `patches`' order.
#[cfg(feature = "parallel")]
pub fn resample_all(
    positions: &[Vector3<f64>],
    normals: &[Vector3<f64>],
    patches: &[Patch],
    config: &Config,
) -> Result<Vec<ResampledPatch>> {
    use rayon::prelude::*;
    patches
        .par_iter()
        .map(|p| resample_patch(positions, normals, p, config.n_bins))
        .collect()
}

#[cfg(not(feature = "parallel"))]
pub fn resample_all(
    positions: &[Vector3<f64>],
    normals: &[Vector3<f64>],
    patches: &[Patch],
    config: &Config,
) -> Result<Vec<ResampledPatch>> {
    patches
        .iter()
        .map(|p| resample_patch(positions, normals, p, config.n_bins))
        .collect()
}
