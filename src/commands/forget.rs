//! Forget command: drop the stored credential for one bridge.
//!
//! This is how a revoked credential is replaced. phlux never re-registers
//! with a bridge whose stored credential is rejected, so the user removes
//! it here and presses the link button before the next run.

use anyhow::Result;

use crate::config::ConfigPaths;
use crate::credentials::{FileCredentialStore, GatewayId};

/// Remove the credential for `gateway_id`. Returns whether one existed.
pub fn forget_credential(paths: &ConfigPaths, gateway_id: &str) -> Result<bool> {
    let mut store = FileCredentialStore::load(paths.credentials_file())?;
    store.forget(&GatewayId::new(gateway_id))
}

/// Handle `phlux forget <bridge-id>`.
pub fn handle_forget_command(paths: &ConfigPaths, gateway_id: &str) -> Result<()> {
    log_version!();

    if forget_credential(paths, gateway_id)? {
        log_block_start!("Removed credential for bridge {}", GatewayId::new(gateway_id));
        log_indented!("Press the bridge's link button before the next run to register again");
    } else {
        log_block_start!("No credential stored for bridge {}", GatewayId::new(gateway_id));
    }

    log_end!();
    Ok(())
}
