//! Rarity tiers of needed pieces.

use std::collections::BTreeMap;

use barter_exchange_primitives::{NeighborView, PieceId, Pieces};
use rand::Rng;
use rand::seq::SliceRandom;

/// Needed pieces grouped by how many neighbors can serve them.
///
/// Pieces no neighbor holds are left out: nobody can be asked for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RarityTiers {
    tiers: BTreeMap<usize, Vec<PieceId>>,
}

impl RarityTiers {
    /// Count availability of every needed piece across `neighbors`.
    pub fn build(pieces: &Pieces, neighbors: &[NeighborView]) -> Self {
        let mut counts: BTreeMap<PieceId, usize> =
            pieces.needed().map(|piece| (piece, 0)).collect();
        for neighbor in neighbors {
            for piece in &neighbor.available_pieces {
                if let Some(count) = counts.get_mut(piece) {
                    *count += 1;
                }
            }
        }

        let mut tiers: BTreeMap<usize, Vec<PieceId>> = BTreeMap::new();
        for (piece, count) in counts.into_iter().filter(|(_, count)| *count > 0) {
            tiers.entry(count).or_default().push(piece);
        }
        Self { tiers }
    }

    /// Shuffle pieces within each tier to break ties between equally rare pieces.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for tier in self.tiers.values_mut() {
            tier.shuffle(rng);
        }
    }

    /// Number of neighbors holding `piece`, if it is needed and available.
    pub fn rarity(&self, piece: PieceId) -> Option<usize> {
        self.tiers
            .iter()
            .find(|(_, tier)| tier.contains(&piece))
            .map(|(count, _)| *count)
    }

    /// Pieces in rarest-first order.
    pub fn ordered(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.tiers.values().flatten().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn view(id: &str, pieces: &[usize]) -> NeighborView {
        NeighborView::new(id, pieces.iter().copied().map(PieceId::new))
    }

    #[test]
    fn test_tiers_by_count() {
        let pieces = Pieces::empty(4, 2);
        let neighbors = [view("a", &[0, 1, 2]), view("b", &[1, 2]), view("c", &[2])];
        let tiers = RarityTiers::build(&pieces, &neighbors);

        assert_eq!(tiers.rarity(PieceId::new(0)), Some(1));
        assert_eq!(tiers.rarity(PieceId::new(1)), Some(2));
        assert_eq!(tiers.rarity(PieceId::new(2)), Some(3));
        // Piece 3 is needed but nobody holds it.
        assert_eq!(tiers.rarity(PieceId::new(3)), None);
        assert_eq!(tiers.len(), 3);

        let order: Vec<_> = tiers.ordered().map(PieceId::index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_owned_pieces_excluded() {
        let pieces = Pieces::from_owned(vec![2, 1], 2).unwrap();
        let tiers = RarityTiers::build(&pieces, &[view("a", &[0, 1])]);
        let order: Vec<_> = tiers.ordered().map(PieceId::index).collect();
        assert_eq!(order, vec![1]);
    }

    #[test]
    fn test_shuffle_keeps_tiers() {
        let pieces = Pieces::empty(10, 1);
        let all: Vec<usize> = (0..9).collect();
        let neighbors = [view("a", &all), view("b", &[9])];
        let mut tiers = RarityTiers::build(&pieces, &neighbors);
        tiers.shuffle(&mut StdRng::seed_from_u64(7));

        let order: Vec<_> = tiers.ordered().collect();
        assert_eq!(order.len(), 10);
        // Piece 9 is only held by "b" while 0..9 are only held by "a": all count 1.
        assert!(order.iter().all(|piece| tiers.rarity(*piece) == Some(1)));
    }
}
