use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Construct a deterministic RNG from a fixed seed.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform noise in `[-amplitude, amplitude]`; a non-positive amplitude yields zeros.
pub fn uniform_noise<R: Rng>(rng: &mut R, amplitude: f64, len: usize) -> Result<Vec<f64>> {
    if !amplitude.is_finite() {
        bail!("noise amplitude must be finite, got {}", amplitude);
    }
    if amplitude <= 0.0 {
        return Ok(vec![0.0; len]);
    }
    Ok((0..len)
        .map(|_| rng.gen_range(-amplitude..=amplitude))
        .collect())
}
