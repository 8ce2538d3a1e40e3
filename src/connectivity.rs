use crate::resample::ResampledPatch;
use crate::segment::Patch;

/// A `(patch, grid)` reference; the seed of a patch is encoded as grid
/// `-1`, which sorts before every real grid id and participates in
/// comparisons like any other cell (spec §4.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GridRef {
    pub patch: u32,
    pub grid: i32,
}

/// One intra-patch face, three grid ids within the same patch.
pub type IntraFace = [i32; 3];

/// A bi-patch crack face: the two cells in the shared patch, then the
/// other patch and its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BiCrackFace {
    pub grid_a: i32,
    pub grid_b: i32,
    pub other_patch: u32,
    pub other_grid: i32,
}

/// A tri-patch crack face: three `(patch, grid)` pairs in ascending order.
pub type TriCrackFace = [GridRef; 3];

#[derive(Default)]
pub struct Connectivity {
    pub intra_faces: Vec<Vec<IntraFace>>,
    pub bi_crack_faces: Vec<Vec<BiCrackFace>>,
    pub tri_crack_faces: Vec<TriCrackFace>,
    /// Debug channel: original face index per patch's intra-patch faces.
    pub patch_origin_faces: Vec<Vec<usize>>,
}

/// Build the `(patch, grid)` lookup for every input vertex from the
/// segmenter's patches and the resampler's per-member grid assignment.
pub fn vertex_lookup(vertex_count: usize, patches: &[Patch], resampled: &[ResampledPatch]) -> Vec<GridRef> {
    let mut lookup = vec![GridRef { patch: 0, grid: -1 }; vertex_count];
    for (patch_id, (patch, resampled)) in patches.iter().zip(resampled).enumerate() {
        for (i, &vertex) in patch.members.iter().enumerate() {
            let grid = resampled.member_grid[i].map(|g| g as i32).unwrap_or(-1);
            lookup[vertex as usize] = GridRef {
                patch: patch_id as u32,
                grid,
            };
        }
    }
    lookup
}

/// Classify every original face by how many distinct patches its vertices
/// span, per spec §4.5.
pub fn classify(faces: &[[u32; 3]], lookup: &[GridRef], patch_count: usize) -> Connectivity {
    let mut connectivity = Connectivity {
        intra_faces: vec![Vec::new(); patch_count],
        bi_crack_faces: vec![Vec::new(); patch_count],
        tri_crack_faces: Vec::new(),
        patch_origin_faces: vec![Vec::new(); patch_count],
    };

    for (face_index, face) in faces.iter().enumerate() {
        let mut refs = [
            lookup[face[0] as usize],
            lookup[face[1] as usize],
            lookup[face[2] as usize],
        ];
        refs.sort();

        let (r0, r1, r2) = (refs[0], refs[1], refs[2]);
        if r0.patch == r1.patch && r0.patch == r2.patch {
            let patch = r0.patch as usize;
            connectivity.patch_origin_faces[patch].push(face_index);
            if r0.grid != r1.grid && r0.grid != r2.grid && r1.grid != r2.grid {
                connectivity.intra_faces[patch].push([r0.grid, r1.grid, r2.grid]);
            }
        } else if r0.patch != r1.patch && r0.patch != r2.patch && r1.patch != r2.patch {
            connectivity.tri_crack_faces.push([r0, r1, r2]);
        } else if r0.patch == r1.patch {
            connectivity.bi_crack_faces[r0.patch as usize].push(BiCrackFace {
                grid_a: r0.grid,
                grid_b: r1.grid,
                other_patch: r2.patch,
                other_grid: r2.grid,
            });
        } else if r1.patch == r2.patch {
            connectivity.bi_crack_faces[r1.patch as usize].push(BiCrackFace {
                grid_a: r1.grid,
                grid_b: r2.grid,
                other_patch: r0.patch,
                other_grid: r0.grid,
            });
        } else {
            connectivity.bi_crack_faces[r0.patch as usize].push(BiCrackFace {
                grid_a: r0.grid,
                grid_b: r2.grid,
                other_patch: r1.patch,
                other_grid: r1.grid,
            });
        }
    }

    connectivity
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grid_ref_orders_seed_before_real_cells() {
        let seed = GridRef { patch: 0, grid: -1 };
        let cell = GridRef { patch: 0, grid: 0 };
        assert!(seed < cell);
    }

    #[test]
    fn same_patch_distinct_grids_is_intra_face() {
        let lookup = vec![
            GridRef { patch: 0, grid: -1 },
            GridRef { patch: 0, grid: 0 },
            GridRef { patch: 0, grid: 1 },
        ];
        let faces = vec![[0u32, 1, 2]];
        let conn = classify(&faces, &lookup, 1);
        assert_eq!(conn.intra_faces[0].len(), 1);
        assert!(conn.tri_crack_faces.is_empty());
        assert_eq!(conn.patch_origin_faces[0], vec![0]);
    }

    #[test]
    fn three_distinct_patches_is_tri_crack() {
        let lookup = vec![
            GridRef { patch: 0, grid: -1 },
            GridRef { patch: 1, grid: -1 },
            GridRef { patch: 2, grid: -1 },
        ];
        let faces = vec![[0u32, 1, 2]];
        let conn = classify(&faces, &lookup, 3);
        assert_eq!(conn.tri_crack_faces.len(), 1);
    }

    #[test]
    fn two_shared_one_other_is_bi_crack() {
        let lookup = vec![
            GridRef { patch: 0, grid: 0 },
            GridRef { patch: 0, grid: 1 },
            GridRef { patch: 1, grid: -1 },
        ];
        let faces = vec![[0u32, 1, 2]];
        let conn = classify(&faces, &lookup, 2);
        assert_eq!(conn.bi_crack_faces[0].len(), 1);
        let rec = conn.bi_crack_faces[0][0];
        assert_eq!((rec.grid_a, rec.grid_b), (0, 1));
        assert_eq!(rec.other_patch, 1);
    }

    #[test]
    fn same_cell_intra_degeneracy_is_dropped() {
        let lookup = vec![
            GridRef { patch: 0, grid: 0 },
            GridRef { patch: 0, grid: 0 },
            GridRef { patch: 0, grid: 1 },
        ];
        let faces = vec![[0u32, 1, 2]];
        let conn = classify(&faces, &lookup, 1);
        assert!(conn.intra_faces[0].is_empty());
        assert_eq!(conn.patch_origin_faces[0], vec![0]);
    }
}
