//! Promotion topology: which tier feeds which, and which concrete
//! instances a promotion fans out to.

use crate::error::{Error, Result};
use crate::identity::{EnvId, Tier};
use crate::registry::{EnvRecord, Registry};

/// Tier a code promotion from `local` lands on. Prod never promotes.
pub fn resolve_destination_tier(local: &EnvId) -> Result<Tier> {
    local
        .tier
        .promotion_target()
        .ok_or_else(|| Error::unsupported_tier(local.to_string()))
}

/// All registered instances of `tier`, newest suffix first, so that the
/// instance most recently stood up gets its window before older ones.
pub fn enumerate_destinations(registry: &dyn Registry, tier: Tier) -> Result<Vec<EnvRecord>> {
    let mut ids: Vec<EnvId> = registry
        .list_instances(tier.token())?
        .iter()
        .filter_map(|raw| EnvId::parse(raw).ok())
        .filter(|id| id.tier == tier)
        .collect();

    if ids.is_empty() {
        return Err(Error::no_destination_found(tier.token()));
    }

    ids.sort_by(|a, b| b.sort_suffix().cmp(&a.sort_suffix()));

    ids.iter()
        .map(|id| registry.describe(&id.to_string()))
        .collect()
}

/// The canonical production instance a content refresh pulls from.
/// Only test and stage environments may refresh; prod is the source of
/// truth and never overwrites itself.
pub fn resolve_content_source(
    registry: &dyn Registry,
    local: &EnvId,
    canonical: &str,
) -> Result<EnvRecord> {
    if local.tier == Tier::Prod {
        return Err(Error::invalid_local_tier(local.to_string()));
    }
    // A source that cannot be looked up is as unreachable as one that
    // fails the probe.
    registry
        .describe(canonical)
        .map_err(|e| Error::source_unreachable(canonical, e.message))
}
