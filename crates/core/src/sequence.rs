//! Sequence issuance for human-readable record numbering.

use crate::error::{ClinicalError, ClinicalResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Issues monotonically increasing values per sequence name.
///
/// Implementations must be safe under concurrent callers. Gaps are allowed: a value handed to
/// an invocation that later fails is never reissued.
pub trait SequenceGenerator: Send + Sync {
    fn next_value(&self, sequence: &str) -> ClinicalResult<u64>;
}

/// In-process sequences, each starting at 1.
#[derive(Debug, Default)]
pub struct MemorySequences {
    counters: Mutex<HashMap<String, u64>>,
}

impl MemorySequences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceGenerator for MemorySequences {
    fn next_value(&self, sequence: &str) -> ClinicalResult<u64> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| ClinicalError::Sequence("sequence lock poisoned".into()))?;
        let counter = counters.entry(sequence.to_string()).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| ClinicalError::Sequence(format!("sequence '{sequence}' exhausted")))?;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequences_are_independent() {
        let sequences = MemorySequences::new();
        assert_eq!(sequences.next_value("lab_test").unwrap(), 1);
        assert_eq!(sequences.next_value("lab_test").unwrap(), 2);
        assert_eq!(sequences.next_value("surgery").unwrap(), 1);
    }

    #[test]
    fn test_concurrent_callers_never_share_a_value() {
        let sequences = Arc::new(MemorySequences::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sequences = Arc::clone(&sequences);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| sequences.next_value("imaging_request").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut values: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values.len(), 400);
        assert_eq!(values.last(), Some(&400));
    }
}
