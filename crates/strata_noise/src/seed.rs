/// Seed used for terrain generation.
/// Derives independent sub-seeds so the octave offset stream and the
/// gradient permutation table are not driven by the same number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldSeed {
    pub value: u32,
}

impl WorldSeed {
    /// Stream that feeds the per-octave sample offsets
    pub const OCTAVE_OFFSETS: u32 = 0;
    /// Stream that feeds the Perlin permutation table
    pub const GRADIENTS: u32 = 1;

    pub fn new(seed: u32) -> Self {
        Self { value: seed }
    }

    /// Boost-style hash combine: seed ^ (value + 0x9e3779b9 + (seed << 6) + (seed >> 2))
    pub fn hash_combine(&self, value: u32) -> u32 {
        let seed = self.value;
        seed ^ (value
            .wrapping_add(0x9e3779b9)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2))
    }

    /// Sub-seed for one generation stream
    pub fn stream(&self, stream: u32) -> WorldSeed {
        WorldSeed::new(self.hash_combine(stream))
    }
}

impl From<i32> for WorldSeed {
    fn from(value: i32) -> Self {
        // Bit-preserving so negative seeds stay distinct
        Self::new(value as u32)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_combine_is_deterministic() {
        let seed = WorldSeed::new(12345);
        assert_eq!(seed.hash_combine(67890), seed.hash_combine(67890));
        assert_ne!(seed.hash_combine(67890), 12345);
    }

    #[test]
    fn test_streams_differ() {
        let seed = WorldSeed::from(-7);
        assert_ne!(
            seed.stream(WorldSeed::OCTAVE_OFFSETS),
            seed.stream(WorldSeed::GRADIENTS)
        );
        assert_ne!(WorldSeed::from(-7), WorldSeed::from(7));
    }
}
