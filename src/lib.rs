pub mod config;
pub mod connectivity;
pub mod dictionary;
pub mod edges;
pub mod error;
pub mod format;
pub mod frame;
pub mod mesh;
pub mod reconstruct;
pub mod resample;
pub mod segment;

pub use config::Config;
pub use error::{CodecError, Result};
pub use mesh::{DebugInfo, MeshBuffers};
pub use reconstruct::ReconstructedMesh;

/// Output of a successful compression: the serialized stream plus the
/// debug channels a caller can inspect without reparsing it.
pub struct CompressedMesh {
    pub text: String,
    pub debug: DebugInfo,
}

/// Run the full compression pipeline: validate, segment into patches,
/// resample each into a local height grid, factor the stack via SVD,
/// classify face connectivity, and serialize. See spec §2 for the
/// dependency order this function drives leaf-first.
pub fn compress(mesh: &MeshBuffers, config: Config) -> Result<CompressedMesh> {
    mesh.validate()?;
    let config = config.validate()?;

    let normals = mesh.unit_normals();
    let (edges, kappa) = edges::EdgeTable::build(mesh.positions, &normals, mesh.faces)?;
    let patches = segment::segment(&edges, &kappa, &normals, &config);
    let resampled = resample::resample_all(mesh.positions, &normals, &patches, &config)?;

    let lookup = connectivity::vertex_lookup(mesh.positions.len(), &patches, &resampled);
    let connectivity = connectivity::classify(mesh.faces, &lookup, patches.len());
    let dictionary = dictionary::encode(&resampled, config.n_bins, config.atoms);

    if dictionary.atoms < config.atoms {
        log::warn!(
            "emitted {} atoms, fewer than the {} requested",
            dictionary.atoms,
            config.atoms
        );
    }

    let text = serialize_with(&config, &dictionary, &connectivity, &resampled);

    let debug = DebugInfo {
        patch_origin_faces: connectivity.patch_origin_faces.clone(),
        vertex_to_patch: lookup.iter().map(|r| r.patch as usize).collect(),
        patch_size: patches.iter().map(|p| p.members.len()).collect(),
    };

    Ok(CompressedMesh { text, debug })
}

fn serialize_with(
    config: &Config,
    dictionary: &dictionary::Dictionary,
    connectivity: &connectivity::Connectivity,
    resampled: &[resample::ResampledPatch],
) -> String {
    format::serialize(
        config.n_bins,
        dictionary,
        connectivity,
        resampled,
        config.float_precision,
    )
}

/// Invert a serialized stream back into a mesh. See spec §4.7.
pub fn decompress(text: &str) -> Result<ReconstructedMesh> {
    let decoded = format::deserialize(text)?;
    reconstruct::reconstruct(&decoded)
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn compresses_and_decompresses_a_single_triangle() {
        let positions = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        let normals = vec![Vector3::new(0.0, 0.0, 1.0); 3];
        let faces = vec![[0u32, 1, 2]];
        let mesh = MeshBuffers::new(&positions, &normals, &faces);
        let config = Config {
            n_bins: 4,
            atoms: 1,
            ..Config::default()
        };

        let compressed = compress(&mesh, config).unwrap();
        assert_eq!(compressed.debug.patch_size.len(), 1);

        let reconstructed = decompress(&compressed.text).unwrap();
        assert_eq!(reconstructed.faces.len(), 1);
        assert!((reconstructed.positions[0] - positions[0]).norm() < 1e-6);
    }

    #[test]
    fn rejects_invalid_config_before_doing_any_work() {
        let positions = vec![Vector3::zeros(); 3];
        let normals = vec![Vector3::new(0.0, 0.0, 1.0); 3];
        let faces = vec![[0u32, 1, 2]];
        let mesh = MeshBuffers::new(&positions, &normals, &faces);
        let config = Config {
            n_bins: 0,
            ..Config::default()
        };
        assert!(compress(&mesh, config).is_err());
    }
}
