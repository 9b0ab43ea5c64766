//! Per-round and end-of-run summaries.

use barter_exchange_primitives::{Bandwidth, PeerId, Round};
use serde::{Deserialize, Serialize};

/// What happened in one round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: Round,
    pub requests: usize,
    pub uploads: usize,
    /// Sum of granted bandwidth across all peers.
    pub bandwidth: Bandwidth,
    pub blocks_delivered: u64,
    /// Peers whose last missing block arrived this round.
    pub completed: Vec<PeerId>,
}

/// Final state of one peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSummary {
    pub id: PeerId,
    pub strategy: String,
    pub upload_cap: Bandwidth,
    pub seed: bool,
    /// Round in which the peer became complete; `None` if it never did.
    /// Seeds report round 0.
    pub completed_at: Option<Round>,
    pub blocks_uploaded: u64,
    pub blocks_downloaded: u64,
}

/// Outcome of [`Simulation::run`](crate::Simulation::run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimReport {
    /// Rounds actually played.
    pub rounds: u64,
    pub peers: Vec<PeerSummary>,
}

impl SimReport {
    pub fn all_complete(&self) -> bool {
        self.peers.iter().all(|peer| peer.completed_at.is_some())
    }

    /// Mean completion round of leechers that finished.
    pub fn mean_completion(&self) -> Option<f64> {
        let rounds: Vec<Round> = self
            .peers
            .iter()
            .filter(|peer| !peer.seed)
            .filter_map(|peer| peer.completed_at)
            .collect();
        (!rounds.is_empty()).then(|| rounds.iter().sum::<Round>() as f64 / rounds.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, seed: bool, completed_at: Option<Round>) -> PeerSummary {
        PeerSummary {
            id: PeerId::from(id),
            strategy: "even-split".to_owned(),
            upload_cap: 4.0,
            seed,
            completed_at,
            blocks_uploaded: 0,
            blocks_downloaded: 0,
        }
    }

    #[test]
    fn test_mean_completion_ignores_seeds() {
        let report = SimReport {
            rounds: 10,
            peers: vec![
                summary("s", true, Some(0)),
                summary("a", false, Some(4)),
                summary("b", false, Some(8)),
            ],
        };
        assert!(report.all_complete());
        assert_eq!(report.mean_completion(), Some(6.0));
    }

    #[test]
    fn test_incomplete_run() {
        let report = SimReport {
            rounds: 3,
            peers: vec![summary("a", false, None)],
        };
        assert!(!report.all_complete());
        assert_eq!(report.mean_completion(), None);
    }
}
