//! The variable store backed by a `terraform.tfvars.json` file.
//!
//! No locking: one supervisor per working directory is assumed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use retry::{SupervisorError, VariableStore, Variables};
use tracing::debug;

/// Default location of the variable store, relative to the working directory.
pub const DEFAULT_TFVARS: &str = "terraform.tfvars.json";

/// JSON variable file rewritten in place on every merge.
#[derive(Debug, Clone)]
pub struct TfvarsFile {
    path: PathBuf,
}

impl TfvarsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn config_error(&self, cause: impl std::fmt::Display) -> SupervisorError {
        SupervisorError::config_load(self.path.display(), cause)
    }
}

#[async_trait]
impl VariableStore for TfvarsFile {
    async fn load(&self) -> Result<Variables, SupervisorError> {
        let document = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.config_error(e))?;
        Variables::from_json_str(&document).map_err(|e| self.config_error(e))
    }

    async fn save(&self, variables: &Variables) -> Result<(), SupervisorError> {
        let mut document = variables.to_pretty_json();
        document.push('\n');
        tokio::fs::write(&self.path, document)
            .await
            .map_err(|e| self.config_error(e))?;
        debug!(path = %self.path.display(), variables = variables.len(), "wrote variable store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn vars(value: serde_json::Value) -> Variables {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn merge_rewrites_file_preserving_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_TFVARS);
        std::fs::write(&path, r#"{"vm_size": "Standard_D2", "region": "eastus"}"#).unwrap();
        let store = TfvarsFile::new(&path);

        let merged = store.merge(&vars(json!({"vm_size": "Standard_D4"}))).await.unwrap();

        let expected = vars(json!({"vm_size": "Standard_D4", "region": "eastus"}));
        assert_eq!(merged, expected);
        let on_disk = Variables::from_json_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, expected);
    }

    #[tokio::test]
    async fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TfvarsFile::new(dir.path().join(DEFAULT_TFVARS));

        let err = store.merge(&vars(json!({"a": 1}))).await.unwrap_err();

        assert!(matches!(err, SupervisorError::ConfigLoad { .. }));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn non_object_document_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_TFVARS);
        std::fs::write(&path, "[]").unwrap();

        let err = TfvarsFile::new(&path).load().await.unwrap_err();

        assert!(matches!(err, SupervisorError::ConfigLoad { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
