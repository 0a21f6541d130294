//! Results-screen figures for a finished session.

use crate::model::ScoreBand;
use crate::services::ReviewEntry;
use crate::session::CompletedSession;

/// One row of the per-sentence breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub index: usize,
    pub text: String,
    pub score: u8,
    pub band: ScoreBand,
}

/// Summary of the sentences that were actually evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub title: String,
    /// Rounded mean over evaluated sentences; `0` when none were.
    pub average: u8,
    pub rows: Vec<ReportRow>,
    pub total_sentences: usize,
}

impl SessionReport {
    pub fn from_completed(done: &CompletedSession) -> Self {
        let rows: Vec<ReportRow> = done
            .records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let score = record.as_ref()?.score()?;
                Some(ReportRow {
                    index,
                    text: done
                        .sentences
                        .get(index)
                        .map(|s| s.text.clone())
                        .unwrap_or_default(),
                    score,
                    band: ScoreBand::for_score(score),
                })
            })
            .collect();

        let average = if rows.is_empty() {
            0
        } else {
            let sum: u32 = rows.iter().map(|r| r.score as u32).sum();
            (sum as f32 / rows.len() as f32).round() as u8
        };

        Self {
            title: done.title.clone(),
            average,
            rows,
            total_sentences: done.sentences.len(),
        }
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_score(self.average)
    }

    /// History sent to the reviewer: evaluated sentences only.
    pub fn review_history(&self) -> Vec<ReviewEntry> {
        self.rows
            .iter()
            .map(|r| ReviewEntry {
                text: r.text.clone(),
                score: r.score,
            })
            .collect()
    }
}
