//! Loading the signature table document from disk.

use std::path::Path;

use retry::{SignatureTable, SupervisorError};
use tracing::debug;

/// Default location of the signature table, relative to the working directory.
pub const DEFAULT_SIGNATURE_TABLE: &str = "retries.json";

/// Reads and parses the signature table at `path`.
///
/// Entries keep the order they have in the document, which is also their
/// match precedence.
///
/// # Errors
///
/// [`SupervisorError::ConfigLoad`] if the file cannot be read, is not a JSON
/// object of rules, or contains an empty signature.
pub async fn load_signature_table(path: &Path) -> Result<SignatureTable, SupervisorError> {
    let document = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SupervisorError::config_load(path.display(), e))?;
    let table = SignatureTable::from_json_str(&document)
        .map_err(|e| SupervisorError::config_load(path.display(), e))?;
    debug!(path = %path.display(), signatures = table.len(), "loaded signature table");
    Ok(table)
}
