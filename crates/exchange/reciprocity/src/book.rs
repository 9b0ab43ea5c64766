//! Owned map of reciprocity state, keyed by neighbor.

use std::collections::{BTreeMap, HashMap, HashSet};

use barter_exchange_primitives::{Bandwidth, Download, NeighborView, PeerId, Round, Upload};
use tracing::{debug, trace};

use crate::params::seed_flow;
use crate::{ReciprocityParams, ReciprocityState, TauSeed};

/// Counts of what a round update changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub reciprocated: usize,
    pub defected: usize,
    pub reset: usize,
    pub pruned: usize,
}

/// Serializable view of every entry, ordered by peer id.
pub type BookSnapshot = BTreeMap<PeerId, ReciprocityState>;

/// Reciprocity state for every neighbor the local peer has met.
///
/// Entries are created on first contact and seeded with
/// `flow = upload_cap / 4` and `tau` per the configured [`TauSeed`].
#[derive(Debug, Clone)]
pub struct ReciprocityBook {
    params: ReciprocityParams,
    tau_seed: TauSeed,
    entries: HashMap<PeerId, ReciprocityState>,
}

impl ReciprocityBook {
    pub fn new(params: ReciprocityParams, tau_seed: TauSeed) -> Self {
        Self {
            params,
            tau_seed,
            entries: HashMap::new(),
        }
    }

    pub fn params(&self) -> &ReciprocityParams {
        &self.params
    }

    pub fn tau_seed(&self) -> TauSeed {
        self.tau_seed
    }

    /// State a neighbor starts with on first contact.
    pub fn seed_state(&self, upload_cap: Bandwidth, round: Round) -> ReciprocityState {
        ReciprocityState::new(seed_flow(upload_cap), self.tau_seed.tau(upload_cap), round)
    }

    pub fn get(&self, peer: &PeerId) -> Option<&ReciprocityState> {
        self.entries.get(peer)
    }

    /// Current state of `peer`, or the seed if it has never been met.
    pub fn state_or_seed(&self, peer: &PeerId, upload_cap: Bandwidth) -> ReciprocityState {
        self.entries
            .get(peer)
            .copied()
            .unwrap_or_else(|| self.seed_state(upload_cap, 0))
    }

    /// Entry for `peer`, seeding it on first contact and marking it seen.
    pub fn entry(
        &mut self,
        peer: &PeerId,
        upload_cap: Bandwidth,
        round: Round,
    ) -> &mut ReciprocityState {
        let seed = self.seed_state(upload_cap, round);
        let state = self.entries.entry(peer.clone()).or_insert_with(|| {
            trace!(%peer, flow = seed.flow, tau = seed.tau, "Seeding reciprocity state");
            seed
        });
        state.last_seen = state.last_seen.max(round);
        state
    }

    /// Seed and mark seen every peer in `peers`.
    pub fn touch<'a>(
        &mut self,
        peers: impl IntoIterator<Item = &'a PeerId>,
        upload_cap: Bandwidth,
        round: Round,
    ) {
        for peer in peers {
            self.entry(peer, upload_cap, round);
        }
    }

    /// Apply last round's ledger.
    ///
    /// `uploads` are the uploads this peer granted in the previous round and
    /// `downloads` the blocks it received; `round` is the round being decided.
    pub fn update(
        &mut self,
        round: Round,
        uploads: &[Upload],
        downloads: &[Download],
        neighbors: &[NeighborView],
        upload_cap: Bandwidth,
    ) -> UpdateSummary {
        let mut summary = UpdateSummary::default();
        let ReciprocityParams {
            gamma,
            alpha,
            patience,
            ..
        } = self.params;

        let mut received: HashMap<&PeerId, u64> = HashMap::new();
        for download in downloads.iter().filter(|d| d.blocks > 0) {
            *received.entry(&download.from).or_default() += download.blocks;
        }
        let uploaded_to: HashSet<&PeerId> = uploads
            .iter()
            .filter(|upload| upload.bandwidth > 0.0)
            .map(|upload| &upload.to)
            .collect();

        for (&peer, &blocks) in &received {
            let state = self.entry(peer, upload_cap, round);
            state.reciprocated(blocks, gamma, patience);
            trace!(%peer, blocks, streak = state.streak, tau = state.tau, "Neighbor reciprocated");
            summary.reciprocated += 1;
        }

        for &peer in uploaded_to.iter().filter(|peer| !received.contains_key(*peer)) {
            let state = self.entry(peer, upload_cap, round);
            state.defected(alpha);
            trace!(%peer, tau = state.tau, "Neighbor did not reciprocate");
            summary.defected += 1;
        }

        if self.params.idle_reset {
            let seed = self.seed_state(upload_cap, round);
            for neighbor in neighbors {
                if received.contains_key(&neighbor.id) || uploaded_to.contains(&neighbor.id) {
                    continue;
                }
                if let Some(state) = self.entries.get_mut(&neighbor.id) {
                    state.streak = 0;
                    state.tau = seed.tau;
                    summary.reset += 1;
                }
            }
        }

        for neighbor in neighbors {
            if let Some(state) = self.entries.get_mut(&neighbor.id) {
                state.last_seen = state.last_seen.max(round);
            }
        }

        summary.pruned = self.prune(round);

        debug!(
            round,
            reciprocated = summary.reciprocated,
            defected = summary.defected,
            reset = summary.reset,
            pruned = summary.pruned,
            "Updated reciprocity state"
        );
        summary
    }

    /// Drop entries not seen for more than `prune_after` rounds.
    ///
    /// A no-op when pruning is disabled.
    pub fn prune(&mut self, round: Round) -> usize {
        let Some(silent_rounds) = self.params.prune_after else {
            return 0;
        };
        let before = self.entries.len();
        self.entries
            .retain(|_, state| round.saturating_sub(state.last_seen) <= silent_rounds);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PeerId, &ReciprocityState)> {
        self.entries.iter()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        self.entries
            .iter()
            .map(|(peer, state)| (peer.clone(), *state))
            .collect()
    }
}
