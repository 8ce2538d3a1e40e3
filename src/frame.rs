use nalgebra::{Matrix4, Vector3, Vector4};

/// The orthonormal tangent frame built at a patch seed: `view * translate(-p0)`,
/// where `view`'s rows are `(tangent, bitangent, normal)`. Used by the
/// resampler to project member vertices into local coordinates, and inverted
/// by the reconstructor to lift height samples back to world space. Shared
/// between both directions so the two sides of the codec can never disagree
/// about frame construction (mirrors the original `Compressor::
/// generate_transform`, which both the compressor and the parser called).
pub fn local_frame(seed_position: Vector3<f64>, seed_normal: Vector3<f64>) -> Matrix4<f64> {
    let mut translate = Matrix4::identity();
    translate[(0, 3)] = -seed_position.x;
    translate[(1, 3)] = -seed_position.y;
    translate[(2, 3)] = -seed_position.z;

    let normal = seed_normal.normalize();
    let mut candidate_tangent = Vector3::new(1.0, 0.0, 0.0);
    if normal.cross(&candidate_tangent).norm() < 1e-5 {
        candidate_tangent = Vector3::new(0.0, 1.0, 0.0);
    }
    let tangent = (candidate_tangent - candidate_tangent.dot(&normal) * normal).normalize();
    let bitangent = normal.cross(&tangent).normalize();

    // Rows written out then transposed, exactly as the original built
    // `view` column-wise and then called `transposeInPlace()`.
    let mut view = Matrix4::identity();
    for i in 0..3 {
        view[(i, 0)] = tangent[i];
        view[(i, 1)] = bitangent[i];
        view[(i, 2)] = normal[i];
    }
    let view = view.transpose();

    view * translate
}

/// Apply a 4x4 homogeneous transform to a 3D point, dividing through by `w`
/// when it is nonzero (mirrors the defensive homogenization in the original
/// compressor and parser).
pub fn transform_point(transform: &Matrix4<f64>, point: Vector3<f64>) -> Vector3<f64> {
    let homogeneous = Vector4::new(point.x, point.y, point.z, 1.0);
    let result = transform * homogeneous;
    if result.w != 0.0 {
        Vector3::new(result.x / result.w, result.y / result.w, result.z / result.w)
    } else {
        Vector3::new(result.x, result.y, result.z)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frame_maps_seed_to_origin() {
        let seed = Vector3::new(3.0, -1.0, 2.0);
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let transform = local_frame(seed, normal);
        let local = transform_point(&transform, seed);
        assert!(local.norm() < 1e-9);
    }

    #[test]
    fn frame_round_trips_through_inverse() {
        let seed = Vector3::new(1.0, 2.0, 3.0);
        let normal = Vector3::new(1.0, 1.0, 1.0).normalize();
        let transform = local_frame(seed, normal);
        let inverse = transform.try_inverse().unwrap();
        let p = Vector3::new(4.0, 5.0, 6.0);
        let local = transform_point(&transform, p);
        let back = transform_point(&inverse, local);
        assert!((back - p).norm() < 1e-9);
    }

    #[test]
    fn falls_back_to_world_y_when_normal_is_x() {
        let seed = Vector3::zeros();
        let normal = Vector3::new(1.0, 0.0, 0.0);
        let transform = local_frame(seed, normal);
        assert!(transform.iter().all(|v| v.is_finite()));
        let tangent_row = transform.fixed_view::<1, 3>(0, 0).transpose();
        assert!((tangent_row.norm() - 1.0).abs() < 1e-9);
    }
}
