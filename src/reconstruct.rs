use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::connectivity::GridRef;
use crate::error::{CodecError, Result};
use crate::format::Decoded;
use crate::frame::{local_frame, transform_point};

/// The mesh rebuilt from a decoded stream: flat vertex/normal arrays and
/// the triangle list stitched back together from intra-patch, bi-crack
/// and tri-crack faces.
pub struct ReconstructedMesh {
    pub positions: Vec<Vector3<f64>>,
    pub normals: Vec<Vector3<f64>>,
    pub faces: Vec<[u32; 3]>,
}

/// A patch's seed and masked-cell world positions, computed independently
/// of every other patch so this step can run under `par_iter`. The global
/// vertex indices are assigned afterward, serially, since those must stay
/// in a deterministic patch-then-mask order.
struct PatchVertices {
    seed_position: Vector3<f64>,
    seed_normal: Vector3<f64>,
    cells: Vec<(i32, Vector3<f64>)>,
}

fn compute_patch_vertices(decoded: &Decoded, patch_id: usize) -> Result<PatchVertices> {
    let patch = &decoded.patches[patch_id];
    let transform = local_frame(patch.seed_position, patch.seed_normal);
    let inverse = transform.try_inverse().ok_or_else(|| {
        CodecError::DegenerateGeometry(format!("patch {patch_id}'s seed frame is not invertible"))
    })?;

    let n_bins = decoded.n_bins;
    let reach = patch.span * n_bins as f64;
    let mut cells = Vec::with_capacity(patch.mask.len());
    for &cell in &patch.mask {
        let x_grid = (cell as usize) % n_bins;
        let y_grid = (cell as usize) / n_bins;
        let base = -reach / 2.0;
        let local_x = patch.bias.0 + base + (x_grid as f64 + 0.5) * patch.span;
        let local_y = patch.bias.1 + base + (y_grid as f64 + 0.5) * patch.span;
        let local_z = decoded.heights[(cell as usize, patch_id)];

        let world = transform_point(&inverse, Vector3::new(local_x, local_y, local_z));
        cells.push((cell as i32, world));
    }

    Ok(PatchVertices {
        seed_position: patch.seed_position,
        seed_normal: patch.seed_normal,
        cells,
    })
}

#[cfg(feature = "parallel")]
fn compute_all_patch_vertices(decoded: &Decoded) -> Vec<Result<PatchVertices>> {
    use rayon::prelude::*;
    (0..decoded.patches.len())
        .into_par_iter()
        .map(|id| compute_patch_vertices(decoded, id))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn compute_all_patch_vertices(decoded: &Decoded) -> Vec<Result<PatchVertices>> {
    (0..decoded.patches.len())
        .map(|id| compute_patch_vertices(decoded, id))
        .collect()
}

/// Invert the compression pipeline: materialize every patch's seed and
/// occupied grid cells back into world space, then resolve each recorded
/// face by looking its `(patch, grid)` endpoints up in the vertex table
/// built along the way. See spec §4.7.
pub fn reconstruct(decoded: &Decoded) -> Result<ReconstructedMesh> {
    let patch_vertices = compute_all_patch_vertices(decoded);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut vertex_of = BTreeMap::<GridRef, u32>::new();

    for (patch_id, pv) in patch_vertices.into_iter().enumerate() {
        let pv = pv?;

        let seed_ref = GridRef {
            patch: patch_id as u32,
            grid: -1,
        };
        vertex_of.insert(seed_ref, positions.len() as u32);
        positions.push(pv.seed_position);
        normals.push(pv.seed_normal);

        for (cell, world) in pv.cells {
            let grid_ref = GridRef {
                patch: patch_id as u32,
                grid: cell,
            };
            vertex_of.insert(grid_ref, positions.len() as u32);
            positions.push(world);
            normals.push(pv.seed_normal);
        }
    }

    let resolve = |r: GridRef| -> Result<u32> {
        vertex_of.get(&r).copied().ok_or_else(|| {
            CodecError::malformed_stream(format!(
                "face referenced unknown grid cell {} in patch {}",
                r.grid, r.patch
            ))
        })
    };

    let mut faces = Vec::new();

    for (patch_id, patch) in decoded.patches.iter().enumerate() {
        for face in &patch.intra_faces {
            let a = resolve(GridRef {
                patch: patch_id as u32,
                grid: face[0],
            })?;
            let b = resolve(GridRef {
                patch: patch_id as u32,
                grid: face[1],
            })?;
            let c = resolve(GridRef {
                patch: patch_id as u32,
                grid: face[2],
            })?;
            faces.push([a, b, c]);
        }
        for rec in &patch.bi_crack_faces {
            let a = resolve(GridRef {
                patch: patch_id as u32,
                grid: rec.grid_a,
            })?;
            let b = resolve(GridRef {
                patch: patch_id as u32,
                grid: rec.grid_b,
            })?;
            let c = resolve(GridRef {
                patch: rec.other_patch,
                grid: rec.other_grid,
            })?;
            faces.push([a, b, c]);
        }
    }

    for face in &decoded.tri_crack_faces {
        let a = resolve(face[0])?;
        let b = resolve(face[1])?;
        let c = resolve(face[2])?;
        faces.push([a, b, c]);
    }

    Ok(ReconstructedMesh {
        positions,
        normals,
        faces,
    })
}
