//! Static tier-offer catalog.
//!
//! Read-only reference data consumed by the checkout collaborator. This core
//! never mutates it; only the checkout success callback (tier + point grant)
//! flows back in.

use crate::profile::Tier;
use once_cell::sync::Lazy;

/// One purchasable subscription offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierOffer {
    pub tier: Tier,
    /// Price in cents
    pub price_cents: u32,
    /// Points granted on checkout success
    pub points: i64,
}

/// The static offer catalog.
pub static TIER_OFFERS: Lazy<Vec<TierOffer>> = Lazy::new(|| {
    vec![
        TierOffer {
            tier: Tier::Basic,
            price_cents: 499,
            points: 1000,
        },
        TierOffer {
            tier: Tier::Standard,
            price_cents: 999,
            points: 3000,
        },
        TierOffer {
            tier: Tier::Premium,
            price_cents: 1999,
            points: 10_000,
        },
    ]
});

/// Looks up the offer for a tier, if one is purchasable.
pub fn offer_for(tier: Tier) -> Option<&'static TierOffer> {
    TIER_OFFERS.iter().find(|offer| offer.tier == tier)
}
