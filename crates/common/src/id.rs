//! ID generation utilities.

use ulid::Ulid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// Vote rows are keyed by ULIDs so that rows sort by creation time.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a 64-bit session seed from fresh randomness.
    #[must_use]
    pub fn generate_seed(&self) -> u64 {
        rand::random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_seed_varies() {
        let id_gen = IdGenerator::new();
        let seeds: std::collections::HashSet<u64> =
            (0..64).map(|_| id_gen.generate_seed()).collect();
        assert!(seeds.len() > 1);
        // every bit position is free to change
        assert_eq!(seeds.iter().fold(0, |acc, seed| acc | seed), u64::MAX);
    }
}
