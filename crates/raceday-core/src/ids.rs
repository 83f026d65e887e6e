//! ID prefix constants and generation.
//!
//! Application-generated IDs are `{prefix}-{8 hex chars}`, e.g. `"aud-a3f8b2c1"`.
//! Rows restored from a backup keep whatever id the document carries.

use crate::errors::CoreError;

pub const PREFIX_AUDIT: &str = "aud";

/// Generate a prefixed random ID.
///
/// # Errors
///
/// Returns `CoreError::Other` if the OS random source is unavailable.
pub fn generate_id(prefix: &str) -> Result<String, CoreError> {
    let mut bytes = [0u8; 4];
    getrandom::fill(&mut bytes)
        .map_err(|e| CoreError::Other(anyhow::anyhow!("random source unavailable: {e}")))?;
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    Ok(format!("{prefix}-{hex}"))
}
