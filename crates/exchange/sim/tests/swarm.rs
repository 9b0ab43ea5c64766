//! End-to-end runs of the reference driver.

use barter_allocation::AllocationStrategy;
use barter_exchange_primitives::{ExchangeHistory, PieceId};
use barter_peer::PeerArgs;
use barter_sim::{SimArgs, Simulation};
use strum::IntoEnumIterator;

fn swarm(rng_seed: u64) -> SimArgs {
    SimArgs {
        num_pieces: 8,
        blocks_per_piece: 2,
        seeds: 1,
        leechers: 3,
        max_rounds: 60,
        rng_seed,
        ..Default::default()
    }
}

#[test]
fn test_same_seed_same_run() {
    let args = SimArgs {
        strategies: AllocationStrategy::iter().collect(),
        min_upload_cap: Some(4.0),
        max_upload_cap: Some(12.0),
        leechers: 6,
        ..swarm(11)
    };
    let first = Simulation::new(args.clone(), PeerArgs::default())
        .unwrap()
        .run()
        .unwrap();
    let second = Simulation::new(args, PeerArgs::default())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_even_split_swarm_completes() {
    let peer_args = PeerArgs {
        strategy: AllocationStrategy::EvenSplit,
        upload_cap: 12.0,
        ..Default::default()
    };
    let mut sim = Simulation::new(swarm(3), peer_args).unwrap();
    let report = sim.run().unwrap();

    assert!(report.all_complete(), "{report:?}");
    assert!(report.rounds < 60);
    let leechers: Vec<_> = report.peers.iter().filter(|peer| !peer.seed).collect();
    assert_eq!(leechers.len(), 3);
    for leecher in leechers {
        assert_eq!(leecher.blocks_downloaded, 16);
        assert!(leecher.completed_at.is_some());
    }
}

#[test]
fn test_uploads_respect_each_cap() {
    let args = SimArgs {
        strategies: AllocationStrategy::iter().collect(),
        min_upload_cap: Some(2.0),
        max_upload_cap: Some(10.0),
        leechers: 8,
        max_rounds: 30,
        ..swarm(5)
    };
    let mut sim = Simulation::new(args, PeerArgs::default()).unwrap();
    sim.run().unwrap();

    for node in sim.peers() {
        let cap = node.peer().upload_cap();
        for round in 0..node.ledger().current_round() {
            let granted: f64 = node
                .ledger()
                .uploads(round)
                .iter()
                .map(|upload| upload.bandwidth)
                .sum();
            assert!(granted <= cap + 1e-9 * cap.max(1.0), "{} round {round}", node.peer().id());
        }
    }
}

#[test]
fn test_pieces_never_overflow() {
    let mut sim = Simulation::new(swarm(9), PeerArgs::default()).unwrap();
    for _ in 0..20 {
        sim.step().unwrap();
        for node in sim.peers() {
            let pieces = node.peer().pieces();
            for piece in (0..pieces.num_pieces()).map(PieceId::new) {
                assert!(pieces.owned(piece).unwrap() <= pieces.blocks_per_piece());
            }
        }
    }
}

#[test]
fn test_strategies_assigned_round_robin() {
    let args = SimArgs {
        strategies: vec![AllocationStrategy::Tournament, AllocationStrategy::EvenSplit],
        ..swarm(0)
    };
    let sim = Simulation::new(args, PeerArgs::default()).unwrap();
    let names: Vec<_> = sim
        .peers()
        .iter()
        .map(|node| node.peer().policy_name())
        .collect();
    assert_eq!(names, vec!["greedy-ratio", "tournament", "even-split", "tournament"]);
}

#[test]
fn test_report_serializes() {
    let mut sim = Simulation::new(swarm(1), PeerArgs::default()).unwrap();
    let round = sim.step().unwrap();
    assert_eq!(round.round, 0);
    let json = serde_json::to_value(sim.report()).unwrap();
    assert_eq!(json["rounds"], 1);
    assert_eq!(json["peers"].as_array().map(Vec::len), Some(4));
}
