use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use nalgebra::DMatrix;

use crate::connectivity::{BiCrackFace, Connectivity, GridRef, IntraFace};
use crate::dictionary::Dictionary;
use crate::error::{CodecError, Result};
use crate::resample::ResampledPatch;

/// The fixed, blank-line-delimited section order of the compressed stream.
/// `F` (the feature-list size) is always 1 in this crate: the wire format
/// does not emit a blank line between feature blocks, so a reader that
/// assumed one per feature would desynchronize the moment `F > 1`. This
/// crate never produces or consumes `F != 1` (spec §9, Open Questions).
pub const SECTION_ORDER: &str = "header / features / tri-cracks / per-patch blocks";

/// Serialize a compressed mesh to the fixed text format of spec §4.6.
/// Buffers the entire output and returns it as one `String` so a caller can
/// commit it to disk atomically (`fs::write`) rather than leaving a
/// partially-written file on an I/O error.
pub fn serialize(
    n_bins: usize,
    dictionary: &Dictionary,
    connectivity: &Connectivity,
    patches: &[ResampledPatch],
    precision: usize,
) -> String {
    let mut out = String::new();
    let patch_count = patches.len();

    writeln!(out, "{n_bins} {patch_count}").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "1").unwrap();
    writeln!(out, "{}", dictionary.atoms).unwrap();
    write_matrix_rows(&mut out, &dictionary.basis, precision);
    write_matrix_rows(&mut out, &dictionary.codes, precision);
    writeln!(out).unwrap();

    writeln!(out, "{}", connectivity.tri_crack_faces.len()).unwrap();
    for face in &connectivity.tri_crack_faces {
        writeln!(
            out,
            "{}/{} {}/{} {}/{}",
            face[0].patch, face[0].grid, face[1].patch, face[1].grid, face[2].patch, face[2].grid
        )
        .unwrap();
    }
    writeln!(out).unwrap();

    for (patch_id, patch) in patches.iter().enumerate() {
        writeln!(
            out,
            "{} {} {}",
            fixed(patch.seed_position.x, precision),
            fixed(patch.seed_position.y, precision),
            fixed(patch.seed_position.z, precision)
        )
        .unwrap();
        writeln!(
            out,
            "{} {} {}",
            fixed(patch.seed_normal.x, precision),
            fixed(patch.seed_normal.y, precision),
            fixed(patch.seed_normal.z, precision)
        )
        .unwrap();
        writeln!(
            out,
            "{} {} {}",
            fixed(patch.span, precision),
            fixed(patch.bias.0, precision),
            fixed(patch.bias.1, precision)
        )
        .unwrap();

        writeln!(out, "{}", patch.mask.len()).unwrap();
        if !patch.mask.is_empty() {
            let row: Vec<String> = patch.mask.iter().map(|g| g.to_string()).collect();
            writeln!(out, "{}", row.join(" ")).unwrap();
        }

        writeln!(out, "{}", connectivity.intra_faces[patch_id].len()).unwrap();
        for face in &connectivity.intra_faces[patch_id] {
            writeln!(out, "{} {} {}", face[0], face[1], face[2]).unwrap();
        }

        writeln!(out, "{}", connectivity.bi_crack_faces[patch_id].len()).unwrap();
        for rec in &connectivity.bi_crack_faces[patch_id] {
            writeln!(
                out,
                "{} {} {}/{}",
                rec.grid_a, rec.grid_b, rec.other_patch, rec.other_grid
            )
            .unwrap();
        }
        writeln!(out).unwrap();
    }

    out
}

fn write_matrix_rows(out: &mut String, m: &DMatrix<f64>, precision: usize) {
    for r in 0..m.nrows() {
        let row: Vec<String> = (0..m.ncols()).map(|c| fixed(m[(r, c)], precision)).collect();
        writeln!(out, "{}", row.join(" ")).unwrap();
    }
}

fn fixed(v: f64, precision: usize) -> String {
    format!("{v:.precision$}")
}

/// Write `text` to `path` via a temp file plus rename, so a failure midway
/// through the write never leaves a half-written stream at `path`.
pub fn write_to_file(path: &Path, text: &str) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&tmp_path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn read_from_file(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Everything parsed back out of a compressed stream, before
/// reconstruction lifts it into 3D.
pub struct Decoded {
    pub n_bins: usize,
    pub patch_count: usize,
    pub atoms: usize,
    pub heights: DMatrix<f64>,
    pub tri_crack_faces: Vec<TriCrackRef>,
    pub patches: Vec<DecodedPatch>,
}

pub type TriCrackRef = [GridRef; 3];

pub struct DecodedPatch {
    pub seed_position: nalgebra::Vector3<f64>,
    pub seed_normal: nalgebra::Vector3<f64>,
    pub span: f64,
    pub bias: (f64, f64),
    pub mask: Vec<u32>,
    pub intra_faces: Vec<IntraFace>,
    pub bi_crack_faces: Vec<BiCrackFace>,
}

/// Parse the fixed text format of spec §4.6 back into its component
/// sections. Truncated input or malformed numbers surface as the
/// read-side flavor of `IoFailure`.
pub fn deserialize(text: &str) -> Result<Decoded> {
    let mut tokens = Tokens::new(text);

    let n_bins = tokens.next_usize("n_bins")?;
    let patch_count = tokens.next_usize("patch_count")?;

    let feature_count = tokens.next_usize("feature_count")?;
    if feature_count != 1 {
        return Err(CodecError::malformed_stream(format!(
            "expected exactly one feature block, found {feature_count}"
        )));
    }
    let atoms = tokens.next_usize("atoms")?;
    let feature_len = n_bins * n_bins;
    let mut basis = DMatrix::<f64>::zeros(feature_len, atoms);
    for r in 0..feature_len {
        for c in 0..atoms {
            basis[(r, c)] = tokens.next_f64("dictionary entry")?;
        }
    }
    let mut codes = DMatrix::<f64>::zeros(atoms, patch_count);
    for r in 0..atoms {
        for c in 0..patch_count {
            codes[(r, c)] = tokens.next_f64("code entry")?;
        }
    }
    let heights = &basis * &codes;

    let tri_crack_count = tokens.next_usize("tri_crack_count")?;
    let mut tri_crack_faces = Vec::with_capacity(tri_crack_count);
    for _ in 0..tri_crack_count {
        let a = tokens.next_patch_grid("tri-crack vertex")?;
        let b = tokens.next_patch_grid("tri-crack vertex")?;
        let c = tokens.next_patch_grid("tri-crack vertex")?;
        tri_crack_faces.push([a, b, c]);
    }

    let mut patches = Vec::with_capacity(patch_count);
    for _ in 0..patch_count {
        let x = tokens.next_f64("seed x")?;
        let y = tokens.next_f64("seed y")?;
        let z = tokens.next_f64("seed z")?;
        let nx = tokens.next_f64("seed normal x")?;
        let ny = tokens.next_f64("seed normal y")?;
        let nz = tokens.next_f64("seed normal z")?;
        let span = tokens.next_f64("span")?;
        let bias_x = tokens.next_f64("bias x")?;
        let bias_y = tokens.next_f64("bias y")?;

        let mask_size = tokens.next_usize("mask size")?;
        let mut mask = Vec::with_capacity(mask_size);
        for _ in 0..mask_size {
            mask.push(tokens.next_usize("mask entry")? as u32);
        }

        let intra_count = tokens.next_usize("intra face count")?;
        let mut intra_faces = Vec::with_capacity(intra_count);
        for _ in 0..intra_count {
            let g0 = tokens.next_i32("intra grid")?;
            let g1 = tokens.next_i32("intra grid")?;
            let g2 = tokens.next_i32("intra grid")?;
            intra_faces.push([g0, g1, g2]);
        }

        let bi_count = tokens.next_usize("bi-crack count")?;
        let mut bi_crack_faces = Vec::with_capacity(bi_count);
        for _ in 0..bi_count {
            let grid_a = tokens.next_i32("bi-crack grid a")?;
            let grid_b = tokens.next_i32("bi-crack grid b")?;
            let other = tokens.next_patch_grid("bi-crack other")?;
            bi_crack_faces.push(BiCrackFace {
                grid_a,
                grid_b,
                other_patch: other.patch,
                other_grid: other.grid,
            });
        }

        patches.push(DecodedPatch {
            seed_position: nalgebra::Vector3::new(x, y, z),
            seed_normal: nalgebra::Vector3::new(nx, ny, nz),
            span,
            bias: (bias_x, bias_y),
            mask,
            intra_faces,
            bi_crack_faces,
        });
    }

    Ok(Decoded {
        n_bins,
        patch_count,
        atoms,
        heights,
        tri_crack_faces,
        patches,
    })
}

/// A whitespace-delimited token cursor, the Rust analogue of reading an
/// `std::ifstream` with `operator>>`.
struct Tokens<'a> {
    iter: std::str::SplitAsciiWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            iter: text.split_ascii_whitespace(),
        }
    }

    fn next_token(&mut self, what: &str) -> Result<&'a str> {
        self.iter
            .next()
            .ok_or_else(|| CodecError::malformed_stream(format!("unexpected end of stream reading {what}")))
    }

    fn next_usize(&mut self, what: &str) -> Result<usize> {
        self.next_token(what)?
            .parse()
            .map_err(|_| CodecError::malformed_stream(format!("expected an integer for {what}")))
    }

    fn next_i32(&mut self, what: &str) -> Result<i32> {
        self.next_token(what)?
            .parse()
            .map_err(|_| CodecError::malformed_stream(format!("expected an integer for {what}")))
    }

    fn next_f64(&mut self, what: &str) -> Result<f64> {
        self.next_token(what)?
            .parse()
            .map_err(|_| CodecError::malformed_stream(format!("expected a float for {what}")))
    }

    fn next_patch_grid(&mut self, what: &str) -> Result<GridRef> {
        let token = self.next_token(what)?;
        let (patch, grid) = token
            .split_once('/')
            .ok_or_else(|| CodecError::malformed_stream(format!("expected patch/grid for {what}, got {token}")))?;
        let patch = patch
            .parse()
            .map_err(|_| CodecError::malformed_stream(format!("bad patch id in {what}")))?;
        let grid = grid
            .parse()
            .map_err(|_| CodecError::malformed_stream(format!("bad grid id in {what}")))?;
        Ok(GridRef { patch, grid })
    }
}
