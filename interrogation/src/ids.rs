//! Session code generation.
//!
//! A code is a handful of distinct words from the configured list glued
//! together (`RedFoxJump`). Codes keep the words' casing for display but
//! are stored and looked up lower-cased, so players can type them in any
//! case. Uniqueness is the registry's job; this module only proposes
//! candidates.

use rand::Rng;

use interrogation_core::config::IdGeneration;

use crate::allocation;
use crate::error::AllocationError;

/// Returns the storage key for a session code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.to_lowercase()
}

/// Proposes session codes from a word list.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    words: Vec<String>,
    word_count: usize,
    indices: Vec<usize>,
}

impl IdGenerator {
    /// Creates a generator over the configured word list.
    #[must_use]
    pub fn new(config: &IdGeneration) -> Self {
        Self {
            words: config.words.clone(),
            word_count: config.word_count,
            indices: (0..config.words.len()).collect(),
        }
    }

    /// Number of words per code.
    #[must_use]
    pub const fn word_count(&self) -> usize {
        self.word_count
    }

    /// Upper bound on the number of distinct codes, saturating at `usize::MAX`.
    #[must_use]
    pub fn capacity(&self) -> usize {
        (0..self.word_count).fold(1usize, |acc, i| {
            acc.saturating_mul(self.words.len().saturating_sub(i))
        })
    }

    /// Produces one candidate code.
    ///
    /// Draws `word_count` distinct word positions and concatenates the
    /// words in draw order. A word count of zero yields the empty code.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Unsatisfiable`] if the list holds fewer
    /// words than `word_count`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, AllocationError> {
        if self.word_count == 0 {
            return Ok(String::new());
        }

        let picked = allocation::sample(&self.indices, self.word_count, rng)?;
        Ok(picked.iter().map(|&i| self.words[i].as_str()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn generator(words: &[&str], word_count: usize) -> IdGenerator {
        IdGenerator::new(&IdGeneration {
            words: words.iter().map(ToString::to_string).collect(),
            word_count,
        })
    }

    #[test]
    fn test_code_is_concatenation_of_distinct_words() {
        let words = ["Red", "Fox", "Jump", "Blue"];
        let ids = generator(&words, 3);
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..50 {
            let code = ids.generate(&mut rng).unwrap();
            let used: Vec<&str> = words.iter().copied().filter(|w| code.contains(w)).collect();
            assert_eq!(used.len(), 3, "code {code} should use three distinct words");
            assert_eq!(code.len(), used.iter().map(|w| w.len()).sum::<usize>());
        }
    }

    #[test]
    fn test_zero_word_count_is_empty() {
        let ids = generator(&["Red", "Fox"], 0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(ids.generate(&mut rng).unwrap(), "");
    }

    #[test]
    fn test_too_few_words() {
        let ids = generator(&["Red"], 2);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            ids.generate(&mut rng),
            Err(AllocationError::Unsatisfiable {
                requested: 2,
                available: 1
            })
        ));
    }

    #[test]
    fn test_capacity() {
        assert_eq!(generator(&["a", "b", "c", "d"], 2).capacity(), 12);
        assert_eq!(generator(&["a", "b"], 0).capacity(), 1);
        assert_eq!(generator(&["a"], 2).capacity(), 0);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("RedFoxJump"), "redfoxjump");
        assert_eq!(normalize_code("redfoxjump"), "redfoxjump");
    }
}
