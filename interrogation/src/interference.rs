//! Interference patterns.
//!
//! The suspect must decode an interference pattern to answer the inducer
//! question. Pattern generation sits behind [`InterferenceGenerator`] so a
//! richer puzzle service can be plugged into the registry; the registry
//! only needs a solution sequence and a printable diagram.

use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Shortest chain that still forms a puzzle.
pub const MIN_PATTERN_LENGTH: usize = 2;

/// Longest chain the alphabet allows.
pub const MAX_PATTERN_LENGTH: usize = ALPHABET.len();

/// A directed connection between two symbols in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Symbol the link leaves
    pub from: char,
    /// Symbol the link enters
    pub to: char,
}

/// A generated puzzle: the diagram shown to players and its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterferencePattern {
    /// Symbols in the order that solves the puzzle
    pub solution_sequence: Vec<char>,
    /// Diagram links, in display order
    pub links: Vec<Link>,
}

impl InterferencePattern {
    /// Returns the solution sequence as a string, e.g. `"QDMA"`.
    #[must_use]
    pub fn solution(&self) -> String {
        self.solution_sequence.iter().collect()
    }
}

impl std::fmt::Display for InterferencePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, link) in self.links.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}>{}", link.from, link.to)?;
        }
        Ok(())
    }
}

/// Source of fresh interference patterns.
pub trait InterferenceGenerator: Send + Sync {
    /// Generates a new pattern.
    fn generate(&self, rng: &mut dyn RngCore) -> InterferencePattern;
}

/// Default generator: a chain of distinct letters with its links shuffled.
///
/// Solving means following the links from the one letter nothing points
/// at to the one letter that points nowhere.
#[derive(Debug, Clone, Copy)]
pub struct LetterChainGenerator {
    length: usize,
}

impl LetterChainGenerator {
    /// Creates a generator for chains of `length` letters.
    ///
    /// `length` is clamped to `MIN_PATTERN_LENGTH..=MAX_PATTERN_LENGTH`.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(MIN_PATTERN_LENGTH, MAX_PATTERN_LENGTH),
        }
    }

    /// Chain length after clamping.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }
}

impl InterferenceGenerator for LetterChainGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> InterferencePattern {
        let mut letters = ALPHABET.to_vec();
        letters.shuffle(&mut *rng);
        letters.truncate(self.length);

        let mut links: Vec<Link> = letters
            .windows(2)
            .map(|pair| Link {
                from: pair[0],
                to: pair[1],
            })
            .collect();
        links.shuffle(&mut *rng);

        InterferencePattern {
            solution_sequence: letters,
            links,
        }
    }
}
