use std::collections::VecDeque;

use nalgebra::Vector3;

use crate::config::Config;
use crate::edges::EdgeTable;

/// A patch produced by region growing: its seed (always `members[0]`) and
/// the rest of its members in BFS discovery order.
#[derive(Clone, Debug)]
pub struct Patch {
    pub members: Vec<u32>,
}

impl Patch {
    pub fn seed(&self) -> u32 {
        self.members[0]
    }
}

/// Greedy seeded region growing over the edge adjacency graph, prioritized
/// by curvature magnitude and constrained by a normal-cone tolerance and a
/// per-patch size cap. See spec §4.2.
pub fn segment(edges: &EdgeTable, kappa: &[f64], normals: &[Vector3<f64>], config: &Config) -> Vec<Patch> {
    let n = kappa.len();
    let mut ranking: Vec<u32> = (0..n as u32).collect();
    // Stable sort: ties broken by original vertex index.
    ranking.sort_by(|&a, &b| {
        kappa[b as usize]
            .abs()
            .partial_cmp(&kappa[a as usize].abs())
            .unwrap()
    });

    let cos_tolerance = (config.patch_normal_tolerance_deg.to_radians()).cos();
    let mut covered = vec![false; n];
    let mut patches = Vec::new();

    let mut rank_cursor = 0usize;
    loop {
        while rank_cursor < n && covered[ranking[rank_cursor] as usize] {
            rank_cursor += 1;
        }
        if rank_cursor == n {
            break;
        }
        let seed = ranking[rank_cursor];
        covered[seed as usize] = true;

        let mut members = vec![seed];
        let mut queue = VecDeque::new();
        queue.push_back(seed);
        let seed_normal = normals[seed as usize];

        'bfs: while let Some(v) = queue.pop_front() {
            for edge in edges.neighbors(v) {
                let w = edge.neighbor;
                if covered[w as usize] {
                    continue;
                }
                if seed_normal.dot(&normals[w as usize]) <= cos_tolerance {
                    continue;
                }
                members.push(w);
                covered[w as usize] = true;
                queue.push_back(w);

                if members.len() >= config.patch_size_limit {
                    break 'bfs;
                }
            }
        }

        patches.push(Patch { members });
    }

    patches
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::edges::EdgeTable;

    fn unit_z() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, 1.0)
    }

    #[test]
    fn single_triangle_is_one_patch() {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let normals = vec![unit_z(); 3];
        let faces = vec![[0u32, 1, 2]];
        let (edges, kappa) = EdgeTable::build(&positions, &normals, &faces).unwrap();
        let config = Config::default();
        let patches = segment(&edges, &kappa, &normals, &config);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].members.len(), 3);
        assert_eq!(patches[0].seed(), 0);
    }

    #[test]
    fn tight_tolerance_and_small_cap_yields_many_patches() {
        // A tetrahedron with outward normals and a 45-degree cone: no
        // neighbor pair satisfies the constraint, so every vertex seeds its
        // own singleton patch (spec scenario C).
        let positions = vec![
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(1.0, -1.0, -1.0),
            Vector3::new(-1.0, 1.0, -1.0),
            Vector3::new(-1.0, -1.0, 1.0),
        ];
        let normals: Vec<Vector3<f64>> = positions.iter().map(|p| p.normalize()).collect();
        let faces = vec![[0u32, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
        let (edges, kappa) = EdgeTable::build(&positions, &normals, &faces).unwrap();
        let config = Config {
            patch_normal_tolerance_deg: 45.0,
            ..Config::default()
        };
        let patches = segment(&edges, &kappa, &normals, &config);
        assert_eq!(patches.len(), 4);
        assert!(patches.iter().all(|p| p.members.len() == 1));
    }

    #[test]
    fn every_vertex_is_covered_exactly_once() {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let normals = vec![unit_z(); 4];
        let faces = vec![[0u32, 1, 2], [0, 2, 3]];
        let (edges, kappa) = EdgeTable::build(&positions, &normals, &faces).unwrap();
        let config = Config::default();
        let patches = segment(&edges, &kappa, &normals, &config);
        let mut seen = vec![false; 4];
        for patch in &patches {
            for &m in &patch.members {
                assert!(!seen[m as usize], "vertex {m} covered twice");
                seen[m as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }
}
