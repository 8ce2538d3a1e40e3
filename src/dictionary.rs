use nalgebra::DMatrix;

use crate::resample::ResampledPatch;

/// The shared height-basis dictionary plus the per-patch codes that
/// reconstruct each patch's height grid against it. See spec §4.4.
pub struct Dictionary {
    pub n_bins: usize,
    pub atoms: usize,
    /// Shape `(n_bins * n_bins, atoms)`.
    pub basis: DMatrix<f64>,
    /// Shape `(atoms, patch_count)`.
    pub codes: DMatrix<f64>,
}

/// Stack every patch's height grid as a column of `H`, then factor via
/// thin SVD, retaining `requested_atoms` atoms (or fewer, if the SVD's rank
/// is lower — a `RankCollapse` condition that is logged, not fatal).
pub fn encode(patches: &[ResampledPatch], n_bins: usize, requested_atoms: usize) -> Dictionary {
    let rows = n_bins * n_bins;
    let cols = patches.len();
    let h = DMatrix::from_fn(rows, cols, |r, c| patches[c].heights[r]);

    let svd = h.svd(true, true);
    let u = svd.u.expect("thin U requested");
    let v_t = svd.v_t.expect("thin V^T requested");
    let singular_values = svd.singular_values;

    let available = singular_values.len().min(u.ncols());
    let atoms = if requested_atoms > available {
        log::warn!(
            "requested {requested_atoms} atoms but only {available} are available from the SVD; clamping"
        );
        available
    } else {
        requested_atoms
    };

    let basis = u.columns(0, atoms).into_owned();
    let mut codes = v_t.rows(0, atoms).into_owned();
    for i in 0..atoms {
        for j in 0..cols {
            codes[(i, j)] *= singular_values[i];
        }
    }

    Dictionary {
        n_bins,
        atoms,
        basis,
        codes,
    }
}

impl Dictionary {
    /// `D * C`, the reconstructed height matrix, shape `(n_bins * n_bins,
    /// patch_count)`.
    pub fn reconstruct_heights(&self) -> DMatrix<f64> {
        &self.basis * &self.codes
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fake_patch(heights: Vec<f64>) -> ResampledPatch {
        ResampledPatch {
            seed_position: nalgebra::Vector3::zeros(),
            seed_normal: nalgebra::Vector3::new(0.0, 0.0, 1.0),
            span: 1.0,
            bias: (0.0, 0.0),
            heights,
            mask: vec![],
            member_grid: vec![None],
        }
    }

    #[test]
    fn reconstructs_exactly_with_full_rank() {
        let patches = vec![
            fake_patch(vec![1.0, 0.0, 0.0, 2.0]),
            fake_patch(vec![0.0, 3.0, 1.0, 0.0]),
        ];
        let dict = encode(&patches, 2, 2);
        assert_eq!(dict.atoms, 2);
        let h_hat = dict.reconstruct_heights();
        for c in 0..2 {
            for r in 0..4 {
                assert!((h_hat[(r, c)] - patches[c].heights[r]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn clamps_atoms_to_available_rank() {
        // A single patch column: rank is at most 1.
        let patches = vec![fake_patch(vec![1.0, 2.0, 3.0, 4.0])];
        let dict = encode(&patches, 2, 5);
        assert!(dict.atoms <= 1);
    }
}
