use nalgebra::Vector3;

use crate::error::{CodecError, Result};

/// The immutable input bundle a single compression call borrows. Ownership
/// of vertices, normals and faces stays with the caller; this struct holds
/// only the borrow, for the lifetime of the call.
pub struct MeshBuffers<'a> {
    pub positions: &'a [Vector3<f64>],
    pub normals: &'a [Vector3<f64>],
    pub faces: &'a [[u32; 3]],
}

impl<'a> MeshBuffers<'a> {
    pub fn new(
        positions: &'a [Vector3<f64>],
        normals: &'a [Vector3<f64>],
        faces: &'a [[u32; 3]],
    ) -> Self {
        Self {
            positions,
            normals,
            faces,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Validate index ranges, triangle non-degeneracy and array length
    /// agreement before any patch work starts.
    pub fn validate(&self) -> Result<()> {
        if self.positions.len() != self.normals.len() {
            return Err(CodecError::InputIllFormed(format!(
                "{} positions but {} normals",
                self.positions.len(),
                self.normals.len()
            )));
        }
        let n = self.positions.len() as u32;
        for (i, face) in self.faces.iter().enumerate() {
            for &v in face {
                if v >= n {
                    return Err(CodecError::InputIllFormed(format!(
                        "face {i} references out-of-range vertex {v} (mesh has {n} vertices)"
                    )));
                }
            }
            if face[0] == face[1] || face[0] == face[2] || face[1] == face[2] {
                return Err(CodecError::InputIllFormed(format!(
                    "face {i} is not a proper triangle: {face:?}"
                )));
            }
        }
        Ok(())
    }

    /// Unit normals, re-normalizing defensively (and warning) when the
    /// supplied normal deviates from unit length by more than `1e-4`.
    pub fn unit_normals(&self) -> Vec<Vector3<f64>> {
        self.normals
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let len = n.norm();
                if (len - 1.0).abs() > 1e-4 {
                    log::warn!("vertex {i} normal has magnitude {len}, renormalizing");
                }
                if len > 0.0 {
                    n / len
                } else {
                    *n
                }
            })
            .collect()
    }
}

/// Read-only debug channels surfaced by both compression and reconstruction
/// for a hypothetical visualization collaborator.
#[derive(Clone, Debug, Default)]
pub struct DebugInfo {
    /// Original face index per intra-patch face, grouped by patch.
    pub patch_origin_faces: Vec<Vec<usize>>,
    /// Patch id each input/output vertex belongs to.
    pub vertex_to_patch: Vec<usize>,
    /// Member count per patch.
    pub patch_size: Vec<usize>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn unit_z() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, 1.0)
    }

    #[test]
    fn rejects_mismatched_normal_count() {
        let positions = vec![Vector3::zeros(); 3];
        let normals = vec![unit_z(); 2];
        let faces: Vec<[u32; 3]> = vec![];
        let mesh = MeshBuffers::new(&positions, &normals, &faces);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_face() {
        let positions = vec![Vector3::zeros(); 3];
        let normals = vec![unit_z(); 3];
        let faces = vec![[0u32, 1, 5]];
        let mesh = MeshBuffers::new(&positions, &normals, &faces);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_face() {
        let positions = vec![Vector3::zeros(); 3];
        let normals = vec![unit_z(); 3];
        let faces = vec![[0u32, 0, 1]];
        let mesh = MeshBuffers::new(&positions, &normals, &faces);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn accepts_triangle() {
        let positions = vec![Vector3::zeros(); 3];
        let normals = vec![unit_z(); 3];
        let faces = vec![[0u32, 1, 2]];
        let mesh = MeshBuffers::new(&positions, &normals, &faces);
        assert!(mesh.validate().is_ok());
    }
}
