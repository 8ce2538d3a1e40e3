use nalgebra::Vector3;

use crate::error::{CodecError, Result};

/// One directed edge record: the neighbor vertex, its Euclidean length, and
/// the discrete normal-variation curvature estimate along it.
#[derive(Clone, Copy, Debug)]
pub struct EdgeRecord {
    pub neighbor: u32,
    pub length: f64,
    pub curvature: f64,
}

/// A CSR-style directed adjacency structure: for each vertex, a contiguous
/// run of `EdgeRecord`s in face-iteration insertion order. Built once from
/// the face list, read many times by the segmenter's BFS.
///
/// Reimplements the original "map of maps of lists" as a flat array plus
/// per-vertex offsets, which both avoids the allocation overhead of nested
/// hash maps and pins down neighbor iteration order as an explicit contract
/// rather than an accident of hash iteration.
pub struct EdgeTable {
    offsets: Vec<u32>,
    records: Vec<EdgeRecord>,
}

impl EdgeTable {
    /// Build the table and the per-vertex `kappa = k_max * k_min` curvature
    /// proxy in one pass over the faces.
    pub fn build(
        positions: &[Vector3<f64>],
        normals: &[Vector3<f64>],
        faces: &[[u32; 3]],
    ) -> Result<(Self, Vec<f64>)> {
        let n = positions.len();
        // Collect directed edges in exactly the insertion order the
        // original compressor used: for each face (v0, v1, v2), emit
        // (v0,v1) (v0,v2) (v1,v0) (v1,v2) (v2,v0) (v2,v1).
        let mut raw: Vec<(u32, EdgeRecord)> = Vec::with_capacity(faces.len() * 6);
        for face in faces {
            let pairs = [
                (face[0], face[1]),
                (face[0], face[2]),
                (face[1], face[0]),
                (face[1], face[2]),
                (face[2], face[0]),
                (face[2], face[1]),
            ];
            for (from, to) in pairs {
                let delta = positions[from as usize] - positions[to as usize];
                let len_sq = delta.norm_squared();
                if len_sq == 0.0 {
                    return Err(CodecError::DegenerateGeometry(format!(
                        "zero-length edge between vertices {from} and {to}"
                    )));
                }
                let n_delta = normals[from as usize] - normals[to as usize];
                let curvature = n_delta.dot(&delta) / len_sq;
                raw.push((
                    from,
                    EdgeRecord {
                        neighbor: to,
                        length: len_sq.sqrt(),
                        curvature,
                    },
                ));
            }
        }

        // Stable sort by source vertex groups same-vertex edges together
        // while preserving their relative (insertion) order, giving CSR
        // layout without disturbing neighbor-iteration order.
        raw.sort_by_key(|(from, _)| *from);

        let mut offsets = vec![0u32; n + 1];
        for &(from, _) in &raw {
            offsets[from as usize + 1] += 1;
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }
        let records: Vec<EdgeRecord> = raw.into_iter().map(|(_, rec)| rec).collect();

        let mut kappa = vec![0.0f64; n];
        for v in 0..n {
            let incident = &records[offsets[v] as usize..offsets[v + 1] as usize];
            if incident.is_empty() {
                kappa[v] = 0.0;
                continue;
            }
            let mut k_max = f64::NEG_INFINITY;
            let mut k_min = f64::INFINITY;
            for edge in incident {
                k_max = k_max.max(edge.curvature);
                k_min = k_min.min(edge.curvature);
            }
            kappa[v] = k_max * k_min;
        }

        Ok((Self { offsets, records }, kappa))
    }

    /// Neighbors of `v` in insertion order, the BFS neighbor-iteration
    /// contract.
    pub fn neighbors(&self, v: u32) -> &[EdgeRecord] {
        let v = v as usize;
        &self.records[self.offsets[v] as usize..self.offsets[v + 1] as usize]
    }
}
