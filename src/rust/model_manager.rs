use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::TrainedModel;
use crate::data::Schema;

const MAGIC: &[u8; 8] = b"ISSUEMDL";
const FORMAT_VERSION: u32 = 1;
const HASH_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 4 + HASH_LEN;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid model file: {0}")]
    InvalidFormat(String),
    #[error("Unsupported model format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

#[derive(Serialize)]
struct SavedModelRef<'a> {
    input_schema: &'a Schema,
    model: &'a TrainedModel,
}

#[derive(Deserialize)]
struct SavedModel {
    input_schema: Schema,
    model: TrainedModel,
}

/// Saves and loads a trained model together with the schema of the data it was fit on.
///
/// File layout: 8-byte magic, little-endian `u32` format version, SHA-256 of the
/// payload, then the `bincode` payload.
#[derive(Debug, Clone)]
pub struct ModelManager {
    model_path: PathBuf,
}

impl ModelManager {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
        }
    }

    pub fn is_model_saved(&self) -> bool {
        let exists = self.model_path.is_file();
        log::debug!("Model path: {:?} (exists: {})", self.model_path, exists);
        exists
    }

    /// Writes the model, replacing any existing file and creating parent directories.
    pub fn save(&self, model: &TrainedModel, input_schema: &Schema) -> Result<(), ModelError> {
        let payload = bincode::serialize(&SavedModelRef { input_schema, model })?;
        let hash = Sha256::digest(&payload);

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&hash);
        bytes.extend_from_slice(&payload);

        if let Some(parent) = self.model_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            log::debug!("Creating parent directory: {:?}", parent);
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.model_path, &bytes)?;
        log::info!("Saved model ({} bytes, sha256 {:x}) to {:?}", bytes.len(), hash, self.model_path);
        Ok(())
    }

    /// Reads the model and the input schema it was saved with.
    ///
    /// # Errors
    /// - `NotFound` if there is no file at the model path
    /// - `InvalidFormat`, `UnsupportedVersion` or `HashMismatch` if the file is not an intact model
    pub fn load(&self) -> Result<(TrainedModel, Schema), ModelError> {
        if !self.is_model_saved() {
            return Err(ModelError::NotFound(self.model_path.clone()));
        }
        let bytes = fs::read(&self.model_path)?;
        log::info!("Read {} bytes from {:?}", bytes.len(), self.model_path);

        let payload = Self::verified_payload(&bytes)?;
        let saved: SavedModel = bincode::deserialize(payload)?;
        Ok((saved.model, saved.input_schema))
    }

    /// Checks the header and hash without decoding the model. A missing file is `Ok(false)`.
    pub fn verify_model(&self) -> Result<bool, ModelError> {
        if !self.is_model_saved() {
            return Ok(false);
        }
        let bytes = fs::read(&self.model_path)?;
        match Self::verified_payload(&bytes) {
            Ok(_) => Ok(true),
            Err(ModelError::HashMismatch { expected, actual }) => {
                log::warn!("Model hash mismatch: expected {}, got {}", expected, actual);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_model(&self) -> Result<(), ModelError> {
        if self.model_path.exists() {
            fs::remove_file(&self.model_path)?;
        }
        Ok(())
    }

    fn verified_payload(bytes: &[u8]) -> Result<&[u8], ModelError> {
        if bytes.len() < HEADER_LEN {
            return Err(ModelError::InvalidFormat(format!(
                "file is {} bytes, shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC {
            return Err(ModelError::InvalidFormat("unrecognized file signature".into()));
        }
        let (version, rest) = rest.split_at(4);
        let version = u32::from_le_bytes([version[0], version[1], version[2], version[3]]);
        if version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion {
                found: version,
                expected: FORMAT_VERSION,
            });
        }
        let (stored_hash, payload) = rest.split_at(HASH_LEN);
        let expected = to_hex(stored_hash);
        let actual = format!("{:x}", Sha256::digest(payload));
        if expected != actual {
            return Err(ModelError::HashMismatch { expected, actual });
        }
        Ok(payload)
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FittedTransform;
    use crate::data::{GitHubIssue, Record};

    fn sample_model() -> TrainedModel {
        TrainedModel::new(vec![FittedTransform::CacheCheckpoint])
    }

    #[test]
    fn test_save_and_load() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let manager = ModelManager::new(dir.path().join("nested").join("model.bin"));
        assert!(!manager.is_model_saved());

        manager.save(&sample_model(), &GitHubIssue::schema())?;
        assert!(manager.verify_model()?);

        let (model, schema) = manager.load()?;
        assert_eq!(model, sample_model());
        assert_eq!(schema, GitHubIssue::schema());
        Ok(())
    }

    #[test]
    fn test_missing_model() {
        let manager = ModelManager::new("/nonexistent/issue-classifier/model.bin");
        assert!(matches!(manager.load(), Err(ModelError::NotFound(_))));
        assert!(!manager.verify_model().unwrap());
    }

    #[test]
    fn test_bad_signature() {
        let bytes = vec![0u8; HEADER_LEN + 4];
        assert!(matches!(
            ModelManager::verified_payload(&bytes),
            Err(ModelError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; HASH_LEN]);
        assert!(matches!(
            ModelManager::verified_payload(&bytes),
            Err(ModelError::UnsupportedVersion { found: 7, .. })
        ));
    }
}
