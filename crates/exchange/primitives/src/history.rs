//! Completed-round exchange history.

use serde::{Deserialize, Serialize};

use crate::{Download, PeerId, Round, Upload};

/// History of completed rounds as seen by one peer.
///
/// Round `r`'s uploads and downloads become visible once round `r + 1`
/// starts; asking for a round that has not completed yields an empty slice.
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait ExchangeHistory {
    /// The round currently being decided.
    fn current_round(&self) -> Round;

    /// Downloads this peer received in a completed round.
    fn downloads(&self, round: Round) -> &[Download];

    /// Uploads this peer granted in a completed round.
    fn uploads(&self, round: Round) -> &[Upload];

    /// The most recent completed round, if any.
    fn last_round(&self) -> Option<Round> {
        self.current_round().checked_sub(1)
    }
}

/// Uploads granted and downloads received in one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub uploads: Vec<Upload>,
    pub downloads: Vec<Download>,
}

/// Append-only per-peer ledger indexed by round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundLedger {
    rounds: Vec<RoundRecord>,
}

impl RoundLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the current round, recording what happened in it.
    pub fn push_round(&mut self, uploads: Vec<Upload>, downloads: Vec<Download>) -> Round {
        self.rounds.push(RoundRecord { uploads, downloads });
        self.rounds.len() as Round - 1
    }

    pub fn record(&self, round: Round) -> Option<&RoundRecord> {
        usize::try_from(round).ok().and_then(|r| self.rounds.get(r))
    }

    pub fn completed_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Total blocks received from `peer` across all completed rounds.
    pub fn blocks_from(&self, peer: &PeerId) -> u64 {
        self.rounds
            .iter()
            .flat_map(|record| &record.downloads)
            .filter(|download| &download.from == peer)
            .map(|download| download.blocks)
            .sum()
    }
}

impl ExchangeHistory for RoundLedger {
    fn current_round(&self) -> Round {
        self.rounds.len() as Round
    }

    fn downloads(&self, round: Round) -> &[Download] {
        self.record(round)
            .map(|record| record.downloads.as_slice())
            .unwrap_or_default()
    }

    fn uploads(&self, round: Round) -> &[Upload] {
        self.record(round)
            .map(|record| record.uploads.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download(from: &str, blocks: u64) -> Download {
        Download {
            from: PeerId::from(from),
            to: PeerId::from("me"),
            blocks,
        }
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = RoundLedger::new();
        assert_eq!(ledger.current_round(), 0);
        assert_eq!(ledger.last_round(), None);
        assert!(ledger.downloads(0).is_empty());
        assert!(ledger.uploads(0).is_empty());
    }

    #[test]
    fn test_rounds_visible_after_completion() {
        let mut ledger = RoundLedger::new();
        let upload = Upload::new(PeerId::from("me"), PeerId::from("a"), 2.0);
        assert_eq!(ledger.push_round(vec![upload.clone()], vec![download("a", 3)]), 0);

        assert_eq!(ledger.current_round(), 1);
        assert_eq!(ledger.last_round(), Some(0));
        assert_eq!(ledger.uploads(0), &[upload]);
        assert_eq!(ledger.downloads(0).len(), 1);
        // Round 1 is still in progress.
        assert!(ledger.downloads(1).is_empty());
    }

    #[test]
    fn test_blocks_from() {
        let mut ledger = RoundLedger::new();
        ledger.push_round(vec![], vec![download("a", 3), download("b", 1)]);
        ledger.push_round(vec![], vec![download("a", 2)]);
        assert_eq!(ledger.blocks_from(&PeerId::from("a")), 5);
        assert_eq!(ledger.blocks_from(&PeerId::from("c")), 0);
    }

    #[test]
    fn test_history_through_reference() {
        fn round_of(history: impl ExchangeHistory) -> Round {
            history.current_round()
        }
        let mut ledger = RoundLedger::new();
        ledger.push_round(vec![], vec![]);
        assert_eq!(round_of(&ledger), 1);
    }
}
