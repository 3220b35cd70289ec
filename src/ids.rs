// 🔢 Progressive Identifiers
// Replaces class-level static counters with a generator owned by a registry

use serde::{Deserialize, Serialize};

/// Monotonic id source, starting at 1.
///
/// Ids are only consumed through [`IdGenerator::commit`], so a failed
/// construction never burns a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        IdGenerator { next: first }
    }

    /// The id the next successful construction will receive
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Mark the peeked id as used
    pub fn commit(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Peek + commit in one step
    pub fn next_id(&mut self) -> u64 {
        self.commit()
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_is_progressive() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.peek(), 3);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut ids = IdGenerator::starting_at(10);
        assert_eq!(ids.peek(), 10);
        assert_eq!(ids.peek(), 10);
        assert_eq!(ids.commit(), 10);
        assert_eq!(ids.peek(), 11);
    }

    #[test]
    fn test_reset() {
        let mut ids = IdGenerator::new();
        ids.next_id();
        ids.next_id();
        ids.reset();
        assert_eq!(ids.next_id(), 1);
    }
}
