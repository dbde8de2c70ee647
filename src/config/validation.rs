//! Configuration validation.

use anyhow::Result;

use super::Config;
use crate::constants::*;

/// Reject values that would make the update loop misbehave.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(interval) = config.interval
        && !(MINIMUM_INTERVAL..=MAXIMUM_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "interval ({} seconds) must be between {} and {} seconds",
            interval,
            MINIMUM_INTERVAL,
            MAXIMUM_INTERVAL
        );
    }

    if let Some(transition_time) = config.transition_time
        && transition_time > MAXIMUM_TRANSITION_TIME
    {
        anyhow::bail!(
            "transition_time ({}) must be at most {} deciseconds",
            transition_time,
            MAXIMUM_TRANSITION_TIME
        );
    }

    if let Some(hosts) = &config.bridges
        && hosts.iter().any(|host| host.trim().is_empty())
    {
        anyhow::bail!("bridges must not contain empty host names");
    }

    Ok(())
}
