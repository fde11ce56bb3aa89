use std::io;
use std::path::{Path, PathBuf};

const MODEL_DIR_NAME: &str = "raincast";
pub(crate) const MODEL_FILE_NAME: &str = "weather_model.bin";

/// `<user cache dir>/raincast`, or `None` if the platform has no cache directory.
pub fn get_model_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join(MODEL_DIR_NAME))
}

pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("Creating directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Rounds half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(66.666, 1), 66.7);
        assert_eq!(round_to(2.0, 3), 2.0);
    }

    #[tokio::test]
    async fn creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_dir_exists(&nested).await.unwrap();
        assert!(nested.is_dir());
        // Idempotent.
        ensure_dir_exists(&nested).await.unwrap();

        let file = root.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(ensure_dir_exists(&file).await.is_err());
    }
}
