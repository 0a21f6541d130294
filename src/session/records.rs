//! Per-sentence result store.

use crate::model::PerformanceRecord;

/// One optional [`PerformanceRecord`] per sentence, indexed like the script.
///
/// Sentences never attempted (or whose every evaluation failed) stay `None`;
/// a new record for an index replaces the old one.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceLog {
    records: Vec<Option<PerformanceRecord>>,
}

impl PerformanceLog {
    pub fn new(len: usize) -> Self {
        Self {
            records: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PerformanceRecord> {
        self.records.get(index)?.as_ref()
    }

    /// Store `record` at `index`, replacing any earlier one.  Returns `false`
    /// (and stores nothing) when `index` is out of range.
    pub fn store(&mut self, index: usize, record: PerformanceRecord) -> bool {
        match self.records.get_mut(index) {
            Some(slot) => {
                *slot = Some(record);
                true
            }
            None => false,
        }
    }

    pub fn score(&self, index: usize) -> Option<u8> {
        self.get(index)?.score()
    }

    /// Number of sentences with a stored evaluation.
    pub fn evaluated(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.as_ref().and_then(PerformanceRecord::score).is_some())
            .count()
    }

    pub fn as_slice(&self) -> &[Option<PerformanceRecord>] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Evaluation;

    fn record(id: i64, score: u8) -> PerformanceRecord {
        PerformanceRecord {
            sentence_id: id,
            recording: None,
            evaluation: Some(Evaluation {
                score,
                feedback: String::new(),
                pronunciation_tips: String::new(),
            }),
        }
    }

    #[test]
    fn starts_sparse() {
        let log = PerformanceLog::new(3);
        assert_eq!(log.len(), 3);
        assert_eq!(log.as_slice(), &[None, None, None]);
        assert_eq!(log.evaluated(), 0);
    }

    #[test]
    fn latest_record_overwrites() {
        let mut log = PerformanceLog::new(2);
        assert!(log.store(1, record(7, 40)));
        assert!(log.store(1, record(7, 85)));
        assert_eq!(log.score(1), Some(85));
        assert_eq!(log.score(0), None);
        assert_eq!(log.evaluated(), 1);
    }

    #[test]
    fn out_of_range_store_is_refused() {
        let mut log = PerformanceLog::new(1);
        assert!(!log.store(5, record(1, 50)));
        assert!(log.get(5).is_none());
    }
}
