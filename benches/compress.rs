use criterion::{criterion_group, criterion_main, Criterion};
use meshcodec::{compress, Config, MeshBuffers};
use nalgebra::Vector3;

/// A flattened N x N grid of unit squares, two triangles each, with
/// per-vertex normals tilted slightly so the segmenter has real curvature
/// to chase instead of one giant flat patch.
fn grid_mesh(n: usize) -> (Vec<Vector3<f64>>, Vec<Vector3<f64>>, Vec<[u32; 3]>) {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    let mut normals = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            let x = i as f64;
            let y = j as f64;
            let z = 0.05 * ((i * j) as f64).sin();
            positions.push(Vector3::new(x, y, z));
            let tilt = 0.1 * (i as f64 - j as f64) / (n as f64).max(1.0);
            normals.push(Vector3::new(tilt, -tilt, 1.0).normalize());
        }
    }

    let mut faces = Vec::new();
    let stride = n + 1;
    for j in 0..n {
        for i in 0..n {
            let a = (j * stride + i) as u32;
            let b = (j * stride + i + 1) as u32;
            let c = ((j + 1) * stride + i) as u32;
            let d = ((j + 1) * stride + i + 1) as u32;
            faces.push([a, b, d]);
            faces.push([a, d, c]);
        }
    }
    (positions, normals, faces)
}

fn bench_compress(c: &mut Criterion) {
    let (positions, normals, faces) = grid_mesh(24);
    let config = Config::default();

    c.bench_function("compress_24x24_grid", |b| {
        b.iter(|| {
            let mesh = MeshBuffers::new(&positions, &normals, &faces);
            compress(&mesh, config).unwrap()
        })
    });
}

criterion_group!(benches, bench_compress);
criterion_main!(benches);
