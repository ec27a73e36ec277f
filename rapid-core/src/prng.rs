//! Small noncryptographic PRNG backing random bitstreams.
//!
//! This is Bob Jenkins' "A Small Noncryptographic PRNG" (JSF) in its 64-bit
//! variant. It is fast, has a tiny state and produces the same sequence for
//! the same seed on every platform. It must never be used for secrets.

use rand::{RngCore, SeedableRng};

/// JSF64 generator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jsf64 {
    a: u64,
    b: u64,
    c: u64,
    d: u64,
}

impl Jsf64 {
    /// Create a generator from a seed, discarding the first 20 outputs.
    pub fn new(seed: u64) -> Self {
        let mut rng = Jsf64 {
            a: 0xf1ea5eed,
            b: seed,
            c: seed,
            d: seed,
        };
        for _ in 0..20 {
            rng.step();
        }
        rng
    }

    /// Produce the next word and advance the state.
    #[inline]
    pub fn step(&mut self) -> u64 {
        let e = self.a.wrapping_sub(self.b.rotate_left(7));
        self.a = self.b ^ self.c.rotate_left(13);
        self.b = self.c.wrapping_add(self.d.rotate_left(37));
        self.c = self.d.wrapping_add(e);
        self.d = e.wrapping_add(self.a);
        self.d
    }
}

impl RngCore for Jsf64 {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Jsf64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Jsf64::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Jsf64::new(state)
    }
}
