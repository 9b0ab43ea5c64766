//! Swarm state and the round loop.

use std::collections::HashMap;

use barter_exchange_primitives::{
    Download, NeighborView, PeerId, Pieces, Request, Round, RoundLedger, Upload,
};
use barter_peer::{ExchangePeer, PeerArgs};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, trace};

use crate::{PeerSummary, RoundReport, SimArgs, SimError, SimReport};

/// A peer together with its view of the exchange history.
#[derive(Debug)]
pub struct SimPeer {
    peer: ExchangePeer,
    ledger: RoundLedger,
    seed: bool,
    completed_at: Option<Round>,
    blocks_uploaded: u64,
    blocks_downloaded: u64,
}

impl SimPeer {
    pub fn peer(&self) -> &ExchangePeer {
        &self.peer
    }

    pub fn ledger(&self) -> &RoundLedger {
        &self.ledger
    }

    pub fn is_seed(&self) -> bool {
        self.seed
    }

    pub fn completed_at(&self) -> Option<Round> {
        self.completed_at
    }

    pub fn summary(&self) -> PeerSummary {
        PeerSummary {
            id: self.peer.id().clone(),
            strategy: self.peer.policy_name().to_owned(),
            upload_cap: self.peer.upload_cap(),
            seed: self.seed,
            completed_at: self.completed_at,
            blocks_uploaded: self.blocks_uploaded,
            blocks_downloaded: self.blocks_downloaded,
        }
    }
}

/// Fully connected swarm driven one synchronous round at a time.
#[derive(Debug)]
pub struct Simulation {
    args: SimArgs,
    peers: Vec<SimPeer>,
    index: HashMap<PeerId, usize>,
    round: Round,
}

impl Simulation {
    /// Build `seeds` complete peers followed by `leechers` empty ones.
    ///
    /// Each peer draws from its own RNG seeded off `args.rng_seed`, so a run
    /// is reproducible from its arguments alone.
    pub fn new(args: SimArgs, peer_args: PeerArgs) -> Result<Self, SimError> {
        args.validate()?;
        let mut rng = StdRng::seed_from_u64(args.rng_seed);
        let total = args.seeds + args.leechers;
        let mut peers = Vec::with_capacity(total);
        let mut index = HashMap::with_capacity(total);

        for i in 0..total {
            let seed = i < args.seeds;
            let mut config = peer_args.clone();
            if let Some((min, max)) = args.upload_cap_range() {
                config.upload_cap = rng.random_range(min..=max);
            }
            let (id, pieces) = if seed {
                (
                    format!("seed-{i}"),
                    Pieces::complete(args.num_pieces, args.blocks_per_piece),
                )
            } else {
                let leecher = i - args.seeds;
                if let Some(&strategy) = args
                    .strategies
                    .get(leecher % args.strategies.len().max(1))
                {
                    config.strategy = strategy;
                }
                (
                    format!("leecher-{leecher}"),
                    Pieces::empty(args.num_pieces, args.blocks_per_piece),
                )
            };

            let peer_rng = StdRng::seed_from_u64(rng.next_u64());
            let peer = ExchangePeer::new(id, pieces, &config, peer_rng)?;
            index.insert(peer.id().clone(), i);
            peers.push(SimPeer {
                completed_at: peer.is_complete().then_some(0),
                peer,
                ledger: RoundLedger::new(),
                seed,
                blocks_uploaded: 0,
                blocks_downloaded: 0,
            });
        }

        debug!(
            seeds = args.seeds,
            leechers = args.leechers,
            pieces = args.num_pieces,
            blocks_per_piece = args.blocks_per_piece,
            "Created simulation"
        );
        Ok(Self {
            args,
            peers,
            index,
            round: 0,
        })
    }

    pub fn args(&self) -> &SimArgs {
        &self.args
    }

    /// The next round to be played.
    pub fn round(&self) -> Round {
        self.round
    }

    pub fn peers(&self) -> &[SimPeer] {
        &self.peers
    }

    pub fn peer(&self, id: &PeerId) -> Option<&SimPeer> {
        self.index.get(id).and_then(|&i| self.peers.get(i))
    }

    pub fn all_complete(&self) -> bool {
        self.peers.iter().all(|node| node.peer.is_complete())
    }

    /// Play one round.
    pub fn step(&mut self) -> Result<RoundReport, SimError> {
        let round = self.round;
        let count = self.peers.len();

        let views: Vec<NeighborView> = self
            .peers
            .iter()
            .map(|node| NeighborView::new(node.peer.id().clone(), node.peer.pieces().held()))
            .collect();
        let neighbors: Vec<Vec<NeighborView>> = (0..count)
            .map(|i| {
                views
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, view)| view.clone())
                    .collect()
            })
            .collect();

        let mut report = RoundReport {
            round,
            ..Default::default()
        };

        // Requests, routed to their responders' inboxes.
        let mut outgoing: Vec<Vec<Request>> = Vec::with_capacity(count);
        let mut inbox: Vec<Vec<Request>> = vec![Vec::new(); count];
        for (node, neighbors) in self.peers.iter_mut().zip(&neighbors) {
            let requests = node.peer.requests(neighbors, &node.ledger)?;
            for request in &requests {
                if let Some(queue) = self
                    .index
                    .get(&request.responder)
                    .and_then(|&i| inbox.get_mut(i))
                {
                    queue.push(request.clone());
                }
            }
            report.requests += requests.len();
            outgoing.push(requests);
        }

        let mut granted: Vec<Vec<Upload>> = Vec::with_capacity(count);
        for ((node, neighbors), requests) in self.peers.iter_mut().zip(&neighbors).zip(&inbox) {
            let uploads = node.peer.uploads(requests, neighbors, &node.ledger)?;
            report.uploads += uploads.len();
            report.bandwidth += uploads.iter().map(|upload| upload.bandwidth).sum::<f64>();
            granted.push(uploads);
        }

        // Realize transfers: floor(bandwidth) blocks, serving the recipient's
        // requests to the sender in order.
        let mut downloads: Vec<Vec<Download>> = vec![Vec::new(); count];
        let mut uploaded = vec![0u64; count];
        for (sender, uploads) in granted.iter().enumerate() {
            for upload in uploads {
                let Some(&recipient) = self.index.get(&upload.to) else {
                    continue;
                };
                let wanted = outgoing
                    .get(recipient)
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                    .iter()
                    .filter(|request| request.responder == upload.from);
                let Some(node) = self.peers.get_mut(recipient) else {
                    continue;
                };

                let mut budget = upload.bandwidth.floor() as u64;
                let mut delivered = 0u64;
                for request in wanted {
                    if budget == 0 {
                        break;
                    }
                    let blocks = u32::try_from(budget).unwrap_or(u32::MAX);
                    let added = u64::from(node.peer.pieces_mut().add_blocks(request.piece, blocks)?);
                    budget -= added;
                    delivered += added;
                }
                if delivered == 0 {
                    continue;
                }

                trace!(from = %upload.from, to = %upload.to, blocks = delivered, round, "Delivered blocks");
                node.blocks_downloaded += delivered;
                if let Some(total) = uploaded.get_mut(sender) {
                    *total += delivered;
                }
                if let Some(received) = downloads.get_mut(recipient) {
                    received.push(Download {
                        from: upload.from.clone(),
                        to: upload.to.clone(),
                        blocks: delivered,
                    });
                }
                report.blocks_delivered += delivered;
            }
        }

        for (((node, uploads), downloads), sent) in self
            .peers
            .iter_mut()
            .zip(granted)
            .zip(downloads)
            .zip(uploaded)
        {
            node.ledger.push_round(uploads, downloads);
            node.blocks_uploaded += sent;
            if node.completed_at.is_none() && node.peer.is_complete() {
                node.completed_at = Some(round);
                report.completed.push(node.peer.id().clone());
            }
        }

        self.round += 1;
        debug!(
            round,
            requests = report.requests,
            uploads = report.uploads,
            blocks = report.blocks_delivered,
            completed = report.completed.len(),
            "Round finished"
        );
        Ok(report)
    }

    /// Step until every peer is complete or the round limit is reached.
    pub fn run(&mut self) -> Result<SimReport, SimError> {
        while self.round < self.args.max_rounds && !self.all_complete() {
            self.step()?;
        }
        Ok(self.report())
    }

    pub fn report(&self) -> SimReport {
        SimReport {
            rounds: self.round,
            peers: self.peers.iter().map(SimPeer::summary).collect(),
        }
    }
}
