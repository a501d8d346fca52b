use crate::core::loader::{LoadFailure, MetricsSource, parse_document};
use crate::core::metrics::MetricsDocument;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Reads the metrics document from a local file.
pub struct FileMetricsSource {
    path: PathBuf,
}

impl FileMetricsSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileMetricsSource { path: path.into() }
    }
}

#[async_trait]
impl MetricsSource for FileMetricsSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<MetricsDocument, LoadFailure> {
        let location = self.location();
        debug!("Reading metrics document from {}", location);

        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| LoadFailure::Unavailable {
                location: location.clone(),
                reason: e.to_string(),
            })?;

        parse_document(&location, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::fixtures::SAMPLE_JSON;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_from_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("dashboard_data.json");
        std::fs::write(&path, SAMPLE_JSON)?;

        let doc = FileMetricsSource::new(&path).load().await?;

        assert_eq!(doc.fund3.metrics.risk_metrics.risk_level, "Medium");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("missing.json");

        let err = FileMetricsSource::new(&path).load().await.unwrap_err();

        assert!(matches!(err, LoadFailure::Unavailable { .. }));
        assert_eq!(err.location(), path.display().to_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_json_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("dashboard_data.json");
        std::fs::write(&path, "<html>404</html>")?;

        let err = FileMetricsSource::new(&path).load().await.unwrap_err();

        assert!(matches!(err, LoadFailure::Malformed { .. }));
        Ok(())
    }
}
