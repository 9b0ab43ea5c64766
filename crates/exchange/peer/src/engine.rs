//! The per-round exchange engine.

use std::collections::HashSet;

use barter_allocation::{AllocationContext, AllocationPolicy, even_split};
use barter_exchange_primitives::{
    Bandwidth, ExchangeError, ExchangeHistory, NeighborView, PeerId, Pieces, Request, Round,
    Upload, validate_neighbors,
};
use barter_piece_selector::PieceSelector;
use barter_reciprocity::{ReciprocityBook, UpdateSummary};
use rand::RngCore;
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::{ConfigError, PeerArgs};

/// Relative slack allowed on the upload-cap check for float rounding.
const CAP_TOLERANCE: f64 = 1e-9;

/// One simulated peer: piece selection, reciprocity bookkeeping and upload
/// allocation behind a single per-round interface.
#[derive(Debug)]
pub struct ExchangePeer<R = StdRng> {
    id: PeerId,
    pieces: Pieces,
    selector: PieceSelector,
    policy: Box<dyn AllocationPolicy>,
    book: ReciprocityBook,
    rng: R,
    upload_cap: Bandwidth,
    lookback_rounds: u64,
    /// Round whose reciprocity update has already been applied.
    updated_for: Option<Round>,
}

impl<R: RngCore> ExchangePeer<R> {
    pub fn new(
        id: impl Into<PeerId>,
        pieces: Pieces,
        args: &PeerArgs,
        rng: R,
    ) -> Result<Self, ConfigError> {
        args.validate()?;
        let policy = args.strategy.build(&args.policy_params());
        let tau_seed = args.tau_seed.unwrap_or_else(|| policy.tau_seed());
        let id = id.into();
        debug!(
            peer = %id,
            strategy = %args.strategy,
            upload_cap = args.upload_cap,
            %tau_seed,
            "Created exchange peer"
        );
        Ok(Self {
            id,
            pieces,
            selector: PieceSelector::new(args.max_requests),
            policy,
            book: ReciprocityBook::new(args.reciprocity_params(), tau_seed),
            rng,
            upload_cap: args.upload_cap,
            lookback_rounds: args.lookback_rounds,
            updated_for: None,
        })
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn pieces(&self) -> &Pieces {
        &self.pieces
    }

    /// Mutable access for the driver to record delivered blocks.
    pub fn pieces_mut(&mut self) -> &mut Pieces {
        &mut self.pieces
    }

    pub fn reciprocity(&self) -> &ReciprocityBook {
        &self.book
    }

    pub fn upload_cap(&self) -> Bandwidth {
        self.upload_cap
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn is_complete(&self) -> bool {
        self.pieces.is_complete()
    }

    /// Requests for this round, rarest pieces first, at most
    /// `max_requests` per neighbor.
    pub fn requests<H: ExchangeHistory + ?Sized>(
        &mut self,
        neighbors: &[NeighborView],
        history: &H,
    ) -> Result<Vec<Request>, ExchangeError> {
        let requests = self
            .selector
            .select(&self.id, &self.pieces, neighbors, &mut self.rng)
            .inspect_err(|err| warn!(peer = %self.id, %err, "Rejected neighbor views"))?;
        trace!(
            peer = %self.id,
            round = history.current_round(),
            count = requests.len(),
            "Built requests"
        );
        Ok(requests)
    }

    /// Uploads granted this round in answer to `requests`.
    ///
    /// The first call in a round applies last round's reciprocity update.
    /// Until `lookback_rounds` rounds have completed every strategy splits
    /// the cap evenly.
    pub fn uploads<H: ExchangeHistory + ?Sized>(
        &mut self,
        requests: &[Request],
        neighbors: &[NeighborView],
        history: &H,
    ) -> Result<Vec<Upload>, ExchangeError> {
        let round = history.current_round();
        validate_neighbors(&self.id, self.pieces.num_pieces(), neighbors)
            .inspect_err(|err| warn!(peer = %self.id, %err, "Rejected neighbor views"))?;
        let requesters = self
            .requesters(requests)
            .inspect_err(|err| warn!(peer = %self.id, %err, "Rejected incoming request"))?;

        self.update_reciprocity(round, neighbors, history);
        self.book.touch(&requesters, self.upload_cap, round);

        if requesters.is_empty() {
            trace!(peer = %self.id, round, "No requests, nothing to upload");
            return Ok(Vec::new());
        }

        let last_downloads = history
            .last_round()
            .map(|last| history.downloads(last))
            .unwrap_or_default();
        let ctx = AllocationContext {
            local: &self.id,
            requesters: &requesters,
            neighbors,
            pieces: &self.pieces,
            book: &self.book,
            last_downloads,
            upload_cap: self.upload_cap,
        };

        let uploads = if round < self.lookback_rounds {
            debug!(peer = %self.id, round, requesters = requesters.len(), "Bootstrap even split");
            even_split(&ctx)
        } else {
            self.policy.allocate(&ctx, &mut self.rng)
        };

        self.check_uploads(&uploads)
            .inspect_err(|err| warn!(peer = %self.id, policy = self.policy.name(), %err, "Invalid allocation"))?;
        trace!(
            peer = %self.id,
            round,
            policy = self.policy.name(),
            granted = uploads.len(),
            "Allocated uploads"
        );
        Ok(uploads)
    }

    /// Distinct requesters in arrival order, after checking every request
    /// is addressed here and names a known piece.
    fn requesters(&self, requests: &[Request]) -> Result<Vec<PeerId>, ExchangeError> {
        let mut seen = HashSet::new();
        let mut requesters = Vec::new();
        for request in requests {
            if request.responder != self.id {
                return Err(ExchangeError::MisroutedRequest {
                    requester: request.requester.clone(),
                    responder: request.responder.clone(),
                    local: self.id.clone(),
                });
            }
            self.pieces.check_piece(request.piece)?;
            if seen.insert(&request.requester) {
                requesters.push(request.requester.clone());
            }
        }
        Ok(requesters)
    }

    fn update_reciprocity<H: ExchangeHistory + ?Sized>(
        &mut self,
        round: Round,
        neighbors: &[NeighborView],
        history: &H,
    ) -> Option<UpdateSummary> {
        if self.updated_for == Some(round) {
            return None;
        }
        self.updated_for = Some(round);
        let last = history.last_round()?;
        Some(self.book.update(
            round,
            history.uploads(last),
            history.downloads(last),
            neighbors,
            self.upload_cap,
        ))
    }

    fn check_uploads(&self, uploads: &[Upload]) -> Result<(), ExchangeError> {
        let mut granted = 0.0;
        for upload in uploads {
            granted += ExchangeError::check_bandwidth(upload.bandwidth)?;
        }
        if granted > self.upload_cap + CAP_TOLERANCE * self.upload_cap.max(1.0) {
            return Err(ExchangeError::CapExceeded {
                granted,
                cap: self.upload_cap,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use barter_allocation::AllocationStrategy;
    use barter_exchange_primitives::{Download, PieceId, RoundLedger};
    use barter_reciprocity::TauSeed;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use strum::IntoEnumIterator;

    fn args(strategy: AllocationStrategy, cap: f64) -> PeerArgs {
        PeerArgs {
            strategy,
            upload_cap: cap,
            ..Default::default()
        }
    }

    fn peer(strategy: AllocationStrategy, cap: f64) -> ExchangePeer {
        ExchangePeer::new(
            "me",
            Pieces::complete(4, 2),
            &args(strategy, cap),
            StdRng::seed_from_u64(7),
        )
        .unwrap()
    }

    fn request(from: &str, to: &str, piece: usize) -> Request {
        Request {
            requester: PeerId::from(from),
            responder: PeerId::from(to),
            piece: PieceId::new(piece),
            start_block: 0,
        }
    }

    fn views(ids: &[&str]) -> Vec<NeighborView> {
        ids.iter()
            .map(|id| NeighborView::new(*id, std::iter::empty()))
            .collect()
    }

    #[test]
    fn test_bootstrap_even_split_for_every_strategy() {
        let ledger = RoundLedger::new();
        let neighbors = views(&["a", "b", "c"]);
        let requests = vec![
            request("a", "me", 0),
            request("b", "me", 1),
            request("a", "me", 2),
            request("c", "me", 3),
        ];
        for strategy in AllocationStrategy::iter() {
            let mut peer = peer(strategy, 12.0);
            let uploads = peer.uploads(&requests, &neighbors, &ledger).unwrap();
            let granted: Vec<_> = uploads
                .iter()
                .map(|u| (u.to.as_str(), u.bandwidth))
                .collect();
            assert_eq!(granted, vec![("a", 4.0), ("b", 4.0), ("c", 4.0)], "{strategy}");
        }
    }

    #[test]
    fn test_no_requests_no_uploads() {
        let mut peer = peer(AllocationStrategy::GreedyRatio, 12.0);
        let uploads = peer.uploads(&[], &views(&["a"]), &RoundLedger::new()).unwrap();
        assert!(uploads.is_empty());
    }

    #[test]
    fn test_rejects_misrouted_request() {
        let mut peer = peer(AllocationStrategy::EvenSplit, 12.0);
        let result = peer.uploads(&[request("a", "b", 0)], &views(&["a"]), &RoundLedger::new());
        assert_matches!(result, Err(ExchangeError::MisroutedRequest { .. }));
    }

    #[test]
    fn test_rejects_unknown_piece_in_request() {
        let mut peer = peer(AllocationStrategy::EvenSplit, 12.0);
        let result = peer.uploads(&[request("a", "me", 9)], &views(&["a"]), &RoundLedger::new());
        assert_matches!(result, Err(ExchangeError::UnknownPiece { num_pieces: 4, .. }));
    }

    #[test]
    fn test_rejects_self_in_views() {
        let mut peer = peer(AllocationStrategy::EvenSplit, 12.0);
        let result = peer.requests(&views(&["me"]), &RoundLedger::new());
        assert_matches!(result, Err(ExchangeError::SelfNeighbor(_)));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = ExchangePeer::new(
            "me",
            Pieces::empty(1, 1),
            &args(AllocationStrategy::EvenSplit, f64::INFINITY),
            StdRng::seed_from_u64(0),
        );
        assert_matches!(result, Err(ConfigError::UploadCap(_)));
    }

    #[test]
    fn test_tau_seed_follows_strategy_unless_overridden() {
        let tournament = peer(AllocationStrategy::Tournament, 8.0);
        assert_eq!(tournament.reciprocity().tau_seed(), TauSeed::Unit);
        let greedy = peer(AllocationStrategy::GreedyRatio, 8.0);
        assert_eq!(greedy.reciprocity().tau_seed(), TauSeed::QuarterCap);

        let overridden = ExchangePeer::new(
            "me",
            Pieces::empty(1, 1),
            &PeerArgs {
                strategy: AllocationStrategy::Tournament,
                tau_seed: Some(TauSeed::QuarterCap),
                ..Default::default()
            },
            StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert_eq!(overridden.reciprocity().tau_seed(), TauSeed::QuarterCap);
    }

    #[test]
    fn test_reciprocity_updated_once_per_round() {
        let mut peer = peer(AllocationStrategy::GreedyRatio, 12.0);
        let mut ledger = RoundLedger::new();
        let neighbors = views(&["a", "b"]);
        // Round 0: uploaded to a and b, only a delivered.
        ledger.push_round(
            vec![
                Upload::new(PeerId::from("me"), PeerId::from("a"), 6.0),
                Upload::new(PeerId::from("me"), PeerId::from("b"), 6.0),
            ],
            vec![Download {
                from: PeerId::from("a"),
                to: PeerId::from("me"),
                blocks: 2,
            }],
        );
        let requests = vec![request("a", "me", 0), request("b", "me", 0)];

        peer.uploads(&requests, &neighbors, &ledger).unwrap();
        let after_first = peer.reciprocity().snapshot();
        peer.uploads(&requests, &neighbors, &ledger).unwrap();
        assert_eq!(peer.reciprocity().snapshot(), after_first);

        let a = after_first[&PeerId::from("a")];
        let b = after_first[&PeerId::from("b")];
        assert_eq!(a.flow, 2.0);
        assert_eq!(a.streak, 1);
        // Seed tau is cap / 4, raised by alpha after defection.
        assert!((b.tau - 3.0 * 1.2).abs() < 1e-12);
        assert_eq!(b.streak, 0);
    }

    #[test]
    fn test_even_split_until_lookback_completes() {
        let mut peer = ExchangePeer::new(
            "me",
            Pieces::complete(4, 2),
            &PeerArgs {
                lookback_rounds: 2,
                ..args(AllocationStrategy::GreedyRatio, 12.0)
            },
            StdRng::seed_from_u64(7),
        )
        .unwrap();
        let neighbors = views(&["a", "b", "c"]);
        let requests = vec![
            request("a", "me", 0),
            request("b", "me", 1),
            request("c", "me", 2),
        ];
        let granted = |uploads: &[Upload]| {
            let mut granted: Vec<_> = uploads
                .iter()
                .map(|u| (u.to.as_str().to_owned(), u.bandwidth))
                .collect();
            granted.sort_by(|x, y| x.0.cmp(&y.0));
            granted
        };
        let mut ledger = RoundLedger::new();
        ledger.push_round(vec![], vec![]);

        // One completed round is not enough history yet.
        let uploads = peer.uploads(&requests, &neighbors, &ledger).unwrap();
        assert_eq!(
            granted(&uploads),
            vec![("a".to_owned(), 4.0), ("b".to_owned(), 4.0), ("c".to_owned(), 4.0)]
        );

        ledger.push_round(vec![], vec![]);
        // Greedy ratio now grants each requester its seeded tau of cap / 4.
        let uploads = peer.uploads(&requests, &neighbors, &ledger).unwrap();
        assert_eq!(
            granted(&uploads),
            vec![("a".to_owned(), 3.0), ("b".to_owned(), 3.0), ("c".to_owned(), 3.0)]
        );
    }

    #[test]
    fn test_greedy_ratio_after_bootstrap() {
        let mut peer = peer(AllocationStrategy::GreedyRatio, 4.0);
        let mut ledger = RoundLedger::new();
        ledger.push_round(
            vec![],
            vec![Download {
                from: PeerId::from("a"),
                to: PeerId::from("me"),
                blocks: 3,
            }],
        );
        let requests = vec![request("a", "me", 0), request("b", "me", 1)];
        let uploads = peer.uploads(&requests, &views(&["a", "b"]), &ledger).unwrap();
        // a: flow 3 / tau 1 beats the seed ratio 1 / 1 of b; both fit in 4.
        let order: Vec<_> = uploads.iter().map(|u| u.to.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert!(uploads.iter().all(|u| u.bandwidth == 1.0));
    }

    #[test]
    fn test_requests_resume_partial_piece() {
        let mut peer = ExchangePeer::new(
            "me",
            Pieces::from_owned(vec![4, 1, 0], 4).unwrap(),
            &PeerArgs::default(),
            StdRng::seed_from_u64(3),
        )
        .unwrap();
        let neighbors = vec![NeighborView::new("a", [PieceId::new(0), PieceId::new(1)])];
        let requests = peer.requests(&neighbors, &RoundLedger::new()).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].piece, PieceId::new(1));
        assert_eq!(requests[0].start_block, 1);
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let neighbors = vec![
            NeighborView::new("a", (0..6).map(PieceId::new)),
            NeighborView::new("b", (2..8).map(PieceId::new)),
        ];
        let run = || {
            let mut peer = ExchangePeer::new(
                "me",
                Pieces::empty(8, 2),
                &PeerArgs::default(),
                StdRng::seed_from_u64(42),
            )
            .unwrap();
            peer.requests(&neighbors, &RoundLedger::new()).unwrap()
        };
        assert_eq!(run(), run());
    }

    proptest! {
        #[test]
        fn test_uploads_within_cap(
            cap in 0.0f64..200.0,
            seed in any::<u64>(),
            delivered in proptest::collection::vec(0u64..20, 1..6),
        ) {
            let ids: Vec<String> = (0..delivered.len()).map(|i| format!("p{i}")).collect();
            let neighbors: Vec<_> = ids
                .iter()
                .map(|id| NeighborView::new(id.as_str(), std::iter::empty()))
                .collect();
            let requests: Vec<_> = ids.iter().map(|id| request(id, "me", 0)).collect();
            let mut ledger = RoundLedger::new();
            ledger.push_round(
                vec![],
                ids.iter()
                    .zip(&delivered)
                    .map(|(id, &blocks)| Download {
                        from: PeerId::from(id.as_str()),
                        to: PeerId::from("me"),
                        blocks,
                    })
                    .collect(),
            );

            for strategy in AllocationStrategy::iter() {
                let mut peer = ExchangePeer::new(
                    "me",
                    Pieces::complete(1, 1),
                    &args(strategy, cap),
                    StdRng::seed_from_u64(seed),
                )
                .unwrap();
                let uploads = peer.uploads(&requests, &neighbors, &ledger).unwrap();
                let granted: f64 = uploads.iter().map(|u| u.bandwidth).sum();
                prop_assert!(granted <= cap + 1e-9 * cap.max(1.0));
            }
        }
    }
}
