use crate::error::{CodecError, Result};

/// Tunables the caller provides; see spec §6. `atoms` is a request, not a
/// guarantee — the dictionary coder may emit fewer if the SVD rank is lower.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub atoms: usize,
    pub n_bins: usize,
    pub patch_size_limit: usize,
    pub patch_normal_tolerance_deg: f64,
    pub float_precision: usize,
}

impl Config {
    /// Validate every knob, rejecting non-positive sizes and an
    /// out-of-range normal tolerance before any work begins.
    pub fn validate(self) -> Result<Self> {
        if self.atoms == 0 {
            return Err(CodecError::ConfigInvalid("atoms must be positive".into()));
        }
        if self.n_bins == 0 {
            return Err(CodecError::ConfigInvalid("n_bins must be positive".into()));
        }
        if self.patch_size_limit < 1 {
            return Err(CodecError::ConfigInvalid(
                "patch_size_limit must be positive".into(),
            ));
        }
        if !(0.0..=180.0).contains(&self.patch_normal_tolerance_deg) {
            return Err(CodecError::ConfigInvalid(
                "patch_normal_tolerance must lie in [0, 180] degrees".into(),
            ));
        }
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            atoms: 6,
            n_bins: 10,
            patch_size_limit: 22,
            patch_normal_tolerance_deg: 90.0,
            float_precision: 4,
        }
    }
}
