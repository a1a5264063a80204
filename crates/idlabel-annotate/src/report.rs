//! Pass accounting

use serde::{Deserialize, Serialize};

/// Outcome of one [`Annotator::annotate`](crate::Annotator::annotate) call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotateOutcome {
    /// Node lies in an excluded region
    Excluded,
    /// Node was already processed
    AlreadyMarked,
    /// Node already held a labeled span; only the mark was set
    MarkedOnly,
    /// Text nodes were rewritten (possibly zero) and the mark was set
    Rewritten {
        /// Number of text nodes replaced
        text_nodes: usize,
    },
}

/// Counters for one annotation or clearing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Candidate elements visited
    pub candidates: usize,
    /// Text nodes replaced with labeled fragments
    pub rewritten: usize,
    /// Candidates marked without rewriting
    pub marked_only: usize,
    /// Candidates skipped (excluded or already marked)
    pub skipped: usize,
    /// Candidates that failed
    pub failed: usize,
    /// Labeled spans removed
    pub cleared: usize,
    /// Whether the document title changed
    pub title_updated: bool,
}

impl PassReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: &PassReport) {
        self.candidates += other.candidates;
        self.rewritten += other.rewritten;
        self.marked_only += other.marked_only;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.cleared += other.cleared;
        self.title_updated |= other.title_updated;
    }

    /// Record one outcome
    pub fn record(&mut self, outcome: AnnotateOutcome) {
        self.candidates += 1;
        match outcome {
            AnnotateOutcome::Excluded | AnnotateOutcome::AlreadyMarked => self.skipped += 1,
            AnnotateOutcome::MarkedOnly => self.marked_only += 1,
            AnnotateOutcome::Rewritten { text_nodes } => self.rewritten += text_nodes,
        }
    }

    /// Record one failed candidate
    pub fn record_failure(&mut self) {
        self.candidates += 1;
        self.failed += 1;
    }

    /// Whether the pass changed the document
    #[must_use]
    pub fn changed(&self) -> bool {
        self.rewritten > 0 || self.cleared > 0 || self.title_updated
    }
}
