use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use meshcodec::{compress, decompress, Config, MeshBuffers};
use nalgebra::Vector3;

#[derive(Debug, Parser)]
#[command(version, author = "Jonathan Zrake <jonathan.zrake@gmail.com>")]
struct Opts {
    #[command(subcommand)]
    command: Command,

    /// Emit debug-level log output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compress a mesh into the compact patch/grid representation.
    Compress {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value_t = Config::default().atoms)]
        atoms: usize,

        #[arg(long, default_value_t = Config::default().n_bins)]
        n_bins: usize,

        #[arg(long, default_value_t = Config::default().patch_size_limit)]
        patch_size_limit: usize,

        #[arg(long, default_value_t = Config::default().patch_normal_tolerance_deg)]
        patch_normal_tolerance_deg: f64,

        #[arg(long, default_value_t = Config::default().float_precision)]
        float_precision: usize,
    },
    /// Reconstruct a mesh from a compressed stream.
    Decompress { input: PathBuf, output: PathBuf },
}

fn main() {
    let opts = Opts::parse();

    let level = if opts.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .expect("logger already initialized");

    if let Err(err) = run(opts.command) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> meshcodec::Result<()> {
    match command {
        Command::Compress {
            input,
            output,
            atoms,
            n_bins,
            patch_size_limit,
            patch_normal_tolerance_deg,
            float_precision,
        } => {
            let config = Config {
                atoms,
                n_bins,
                patch_size_limit,
                patch_normal_tolerance_deg,
                float_precision,
            };
            let text = fs::read_to_string(&input)?;
            let (positions, normals, faces) = read_mesh(&text)?;
            let mesh = MeshBuffers::new(&positions, &normals, &faces);

            let compressed = compress(&mesh, config)?;
            meshcodec::format::write_to_file(&output, &compressed.text)?;

            let sizes = &compressed.debug.patch_size;
            let mean = sizes.iter().sum::<usize>() as f64 / sizes.len().max(1) as f64;
            log::info!(
                "wrote {} ({} patches, mean size {:.1})",
                output.display(),
                sizes.len(),
                mean
            );
            Ok(())
        }
        Command::Decompress { input, output } => {
            let text = meshcodec::format::read_from_file(&input)?;
            let mesh = decompress(&text)?;
            write_mesh(&output, &mesh)?;
            log::info!(
                "wrote {} ({} vertices, {} faces)",
                output.display(),
                mesh.positions.len(),
                mesh.faces.len()
            );
            Ok(())
        }
    }
}

/// Parse the CLI's plain-text mesh format: a `V F` header, `V` lines of
/// `x y z nx ny nz`, then `F` lines of `a b c` vertex indices.
fn read_mesh(text: &str) -> meshcodec::Result<(Vec<Vector3<f64>>, Vec<Vector3<f64>>, Vec<[u32; 3]>)> {
    let mut tokens = text.split_ascii_whitespace();
    let mut next = |what: &str| -> meshcodec::Result<&str> {
        tokens
            .next()
            .ok_or_else(|| meshcodec::CodecError::malformed_stream(format!("unexpected end of stream reading {what}")))
    };
    let mut next_f64 = |what: &str| -> meshcodec::Result<f64> {
        next(what)?
            .parse()
            .map_err(|_| meshcodec::CodecError::malformed_stream(format!("expected a float for {what}")))
    };
    let mut next_u32 = |what: &str| -> meshcodec::Result<u32> {
        next(what)?
            .parse()
            .map_err(|_| meshcodec::CodecError::malformed_stream(format!("expected an integer for {what}")))
    };

    let vertex_count = next_u32("vertex count")? as usize;
    let face_count = next_u32("face count")? as usize;

    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let x = next_f64("x")?;
        let y = next_f64("y")?;
        let z = next_f64("z")?;
        let nx = next_f64("nx")?;
        let ny = next_f64("ny")?;
        let nz = next_f64("nz")?;
        positions.push(Vector3::new(x, y, z));
        normals.push(Vector3::new(nx, ny, nz));
    }

    let mut faces = Vec::with_capacity(face_count);
    for _ in 0..face_count {
        let a = next_u32("face vertex")?;
        let b = next_u32("face vertex")?;
        let c = next_u32("face vertex")?;
        faces.push([a, b, c]);
    }

    Ok((positions, normals, faces))
}

fn write_mesh(path: &PathBuf, mesh: &meshcodec::ReconstructedMesh) -> meshcodec::Result<()> {
    let mut out = String::new();
    use std::fmt::Write as _;
    writeln!(out, "{} {}", mesh.positions.len(), mesh.faces.len()).unwrap();
    for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
        writeln!(out, "{} {} {} {} {} {}", p.x, p.y, p.z, n.x, n.y, n.z).unwrap();
    }
    for face in &mesh.faces {
        writeln!(out, "{} {} {}", face[0], face[1], face[2]).unwrap();
    }
    meshcodec::format::write_to_file(path, &out)
}
