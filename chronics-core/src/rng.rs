//! Seedable random source handed to every handler.
use rand::{rngs::SmallRng, Error, RngCore, SeedableRng};

/// Random source of a handler.
///
/// Reproducibility is a visible parameter of handler construction: the
/// driver builds one [`EpisodeRng`] per handler from the episode seed and
/// passes it in, rather than the handler inheriting hidden random state.
/// The seed is remembered so that it can be serialized along with the
/// other reproducibility parameters of the episode.
#[derive(Clone, Debug)]
pub struct EpisodeRng {
    seed: u64,
    rng: SmallRng,
}

impl EpisodeRng {
    /// Creates a random source from the given seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// The seed this source was created or last reseeded with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restarts the stream from the given seed.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
    }
}

impl RngCore for EpisodeRng {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.rng.try_fill_bytes(dest)
    }
}
