//! Versioned on-disk format of a trained model.
//!
//! The file is a bincode-encoded `u32` format version followed by the payload.
//! The version is checked before the payload is decoded, so a stale file fails
//! with [`ModelError::UnsupportedVersion`] instead of a decode error.

use crate::model::error::ModelError;
use crate::utils::{ensure_dir_exists, get_model_dir, MODEL_FILE_NAME};
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ARTIFACT_VERSION: u32 = 1;

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Default model file: `<user cache dir>/raincast/weather_model.bin`.
pub fn default_model_path() -> Result<PathBuf, ModelError> {
    get_model_dir()
        .map(|dir| dir.join(MODEL_FILE_NAME))
        .ok_or(ModelError::ModelDirResolution)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ModelError> {
    let mut bytes = bincode::serde::encode_to_vec(ARTIFACT_VERSION, BINCODE_CONFIG)
        .map_err(|e| ModelError::ArtifactEncode(Box::new(e)))?;
    let payload = bincode::serde::encode_to_vec(value, BINCODE_CONFIG)
        .map_err(|e| ModelError::ArtifactEncode(Box::new(e)))?;
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8], path: &Path) -> Result<T, ModelError> {
    let (version, read) = bincode::serde::decode_from_slice::<u32, _>(bytes, BINCODE_CONFIG)
        .map_err(|e| ModelError::ArtifactDecode(path.to_path_buf(), Box::new(e)))?;
    if version != ARTIFACT_VERSION {
        return Err(ModelError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: version,
            expected: ARTIFACT_VERSION,
        });
    }
    let (value, _) = bincode::serde::decode_from_slice::<T, _>(&bytes[read..], BINCODE_CONFIG)
        .map_err(|e| ModelError::ArtifactDecode(path.to_path_buf(), Box::new(e)))?;
    Ok(value)
}

/// Encodes `value` in a blocking task and writes it to `path`, creating the parent
/// directory when needed.
pub async fn save_artifact<T>(value: Arc<T>, path: &Path) -> Result<(), ModelError>
where
    T: Serialize + Send + Sync + 'static,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir_exists(parent)
            .await
            .map_err(|e| ModelError::ModelDirCreation(parent.to_path_buf(), e))?;
    }
    let bytes = tokio::task::spawn_blocking(move || encode(value.as_ref())).await??;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| ModelError::ArtifactWrite(path.to_path_buf(), e))?;
    info!("Wrote model ({} bytes) to {}", bytes.len(), path.display());
    Ok(())
}

/// Reads and decodes a file written by [`save_artifact`].
pub async fn load_artifact<T>(path: &Path) -> Result<T, ModelError>
where
    T: DeserializeOwned + Send + 'static,
{
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ModelError::ArtifactRead(path.to_path_buf(), e))?;
    let path_buf = path.to_path_buf();
    let value = tokio::task::spawn_blocking(move || decode::<T>(&bytes, &path_buf)).await??;
    info!("Loaded model from {}", path.display());
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        weights: Vec<f64>,
        lookup: HashMap<String, u32>,
    }

    fn payload() -> Payload {
        Payload {
            name: "forest".to_string(),
            weights: vec![0.25, -1.5],
            lookup: HashMap::from([("Sydney".to_string(), 3)]),
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        save_artifact(Arc::new(payload()), &path).await.unwrap();
        let loaded: Payload = load_artifact(&path).await.unwrap();
        assert_eq!(loaded, payload());
    }

    #[tokio::test]
    async fn version_is_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.bin");
        let bytes = bincode::serde::encode_to_vec(7u32, BINCODE_CONFIG).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let err = load_artifact::<Payload>(&path).await.unwrap_err();
        assert!(matches!(
            err,
            ModelError::UnsupportedVersion {
                found: 7,
                expected: ARTIFACT_VERSION,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn truncated_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        let mut bytes = encode(&payload()).unwrap();
        bytes.truncate(10);
        std::fs::write(&path, bytes).unwrap();

        let err = load_artifact::<Payload>(&path).await.unwrap_err();
        assert!(matches!(err, ModelError::ArtifactDecode(..)));
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let err = load_artifact::<Payload>(Path::new("/no/such/model.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ArtifactRead(..)));
    }
}
