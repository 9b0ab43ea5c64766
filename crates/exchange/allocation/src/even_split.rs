//! Even split of the upload cap.

use barter_exchange_primitives::Upload;
use rand::RngCore;

use crate::{AllocationContext, AllocationPolicy};

/// Grant every requester `upload_cap / n`.
///
/// Also the bootstrap rule for every other policy and their fallback when
/// there is no usable signal.
pub fn even_split(ctx: &AllocationContext<'_>) -> Vec<Upload> {
    if ctx.requesters.is_empty() {
        return Vec::new();
    }
    let share = ctx.upload_cap / ctx.requesters.len() as f64;
    ctx.requesters
        .iter()
        .map(|peer| ctx.upload(peer, share))
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvenSplit;

impl AllocationPolicy for EvenSplit {
    fn name(&self) -> &'static str {
        "even-split"
    }

    fn allocate(&self, ctx: &AllocationContext<'_>, _rng: &mut dyn RngCore) -> Vec<Upload> {
        even_split(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::Fixture;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_even_split() {
        let fixture = Fixture::new(&["a", "b", "c"], 90.0);
        let uploads = EvenSplit.allocate(&fixture.ctx(), &mut StdRng::seed_from_u64(0));
        assert_eq!(uploads.len(), 3);
        assert!(uploads.iter().all(|upload| upload.bandwidth == 30.0));
        assert_eq!(uploads[1].to.as_str(), "b");
    }

    #[test]
    fn test_no_requesters() {
        let fixture = Fixture::new(&[], 90.0);
        assert!(even_split(&fixture.ctx()).is_empty());
    }
}
