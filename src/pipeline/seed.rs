use rand::Rng;

/// Exclusive upper bound for freshly drawn base seeds.
pub const MAX_RANDOM_SEED: u64 = 1_000_000_000;

/// Source of the per-request base seed.
pub trait SeedSource: Send + Sync {
    fn next_seed(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSeedSource;

impl SeedSource for RandomSeedSource {
    fn next_seed(&self) -> u64 {
        rand::rng().random_range(0..MAX_RANDOM_SEED)
    }
}

/// Always yields the same seed.
#[derive(Debug, Clone, Copy)]
pub struct FixedSeedSource(pub u64);

impl SeedSource for FixedSeedSource {
    fn next_seed(&self) -> u64 {
        self.0
    }
}
