use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

/// Seeded random number generator for reproducible simulations
#[derive(Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new GameRng with an optional seed
    /// If seed is None, generates a random seed
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            use rand::thread_rng;
            thread_rng().gen()
        });

        let rng = ChaCha8Rng::seed_from_u64(seed);
        GameRng { rng, seed }
    }

    /// Get the seed used for this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate a random integer in range [0, max)
    pub fn random_range(&mut self, max: usize) -> usize {
        self.rng.gen_range(0..max)
    }

    /// Partial Fisher-Yates shuffle: moves a uniform random `count`-subset into the
    /// front of the slice and returns it. The leading slots have the same
    /// distribution as the first `count` elements of a full shuffle.
    pub fn shuffle_prefix<'a, T>(&mut self, array: &'a mut [T], count: usize) -> &'a [T] {
        let count = count.min(array.len());
        for i in 0..count {
            let j = i + self.random_range(array.len() - i);
            array.swap(i, j);
        }
        &array[..count]
    }
}
