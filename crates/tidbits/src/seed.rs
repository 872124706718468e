//! Random positions used to steer the model's pick.

use rand::Rng;
use std::fmt;

use crate::error::{Result, TidbitsError};

/// Lowest position a seed may hold.
pub const SEED_MIN: u8 = 1;

/// Highest position a seed may hold.
pub const SEED_MAX: u8 = 100;

/// Three positions in `[1, 100]`, embedded in the prompt as a selection hint.
///
/// Duplicates are allowed; the prompt asks the model to skip to the next
/// distinct item when two positions collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSeed([u8; 3]);

impl SelectionSeed {
    /// Build a seed from explicit positions.
    pub fn new(positions: [u8; 3]) -> Result<Self> {
        if let Some(bad) = positions
            .iter()
            .find(|p| !(SEED_MIN..=SEED_MAX).contains(*p))
        {
            return Err(TidbitsError::Config(format!(
                "seed position {bad} outside {SEED_MIN}..={SEED_MAX}"
            )));
        }
        Ok(Self(positions))
    }

    /// Draw three fresh positions.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        Self(std::array::from_fn(|_| rng.gen_range(SEED_MIN..=SEED_MAX)))
    }

    #[must_use]
    pub const fn positions(&self) -> [u8; 3] {
        self.0
    }
}

impl fmt::Display for SelectionSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "[{a}, {b}, {c}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_positions_in_range() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1_000 {
            let seed = SelectionSeed::generate(&mut rng);
            assert!(seed
                .positions()
                .iter()
                .all(|p| (SEED_MIN..=SEED_MAX).contains(p)));
        }
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(SelectionSeed::new([12, 57, 90]).is_ok());
        assert!(SelectionSeed::new([1, 100, 50]).is_ok());
        assert!(matches!(
            SelectionSeed::new([0, 57, 90]),
            Err(TidbitsError::Config(_))
        ));
        assert!(SelectionSeed::new([12, 101, 90]).is_err());
    }

    #[test]
    fn test_display_matches_prompt_format() {
        let seed = SelectionSeed::new([12, 57, 90]).unwrap();
        assert_eq!(seed.to_string(), "[12, 57, 90]");
    }
}
