use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tutor_bkt::BktParameters;
use tutor_rag::{RagConfig, RetryPolicy};

/// Contents of the optional TOML config file. Every table may be omitted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TutorConfig {
    pub rag: RagConfig,
    pub retry: RetryPolicy,
    pub bkt: BktParameters,
}

impl TutorConfig {
    /// Read the config at `path`, or the defaults when no path is given.
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        config.rag.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_path_gives_defaults() {
        assert_eq!(TutorConfig::load(None).await.unwrap(), TutorConfig::default());
    }

    #[tokio::test]
    async fn partial_tables_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tutor.toml");
        std::fs::write(
            &path,
            "[rag]\nchunk_size = 500\nchunk_overlap = 50\n\n[bkt]\npL0 = 0.2\npT = 0.1\npS = 0.1\npG = 0.2\n",
        )
        .unwrap();

        let config = TutorConfig::load(Some(&path)).await.unwrap();
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.chunk_overlap, 50);
        assert_eq!(config.rag.match_count, 5);
        assert_eq!(config.bkt.p_l0, 0.2);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[tokio::test]
    async fn rejects_inconsistent_chunking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tutor.toml");
        std::fs::write(&path, "[rag]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();

        assert!(TutorConfig::load(Some(&path)).await.is_err());
    }

    #[tokio::test]
    async fn unreadable_file_names_the_path() {
        let err = TutorConfig::load(Some(Path::new("/no/such/tutor.toml"))).await.unwrap_err();
        assert!(err.to_string().contains("/no/such/tutor.toml"));
    }
}
