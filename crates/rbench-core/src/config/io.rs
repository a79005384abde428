use std::path::Path;

use crate::config::model::BenchConfig;
use crate::error::RbenchError;

/// Read a benchmark configuration (JSON) from disk.
pub async fn read_config(path: impl AsRef<Path>) -> Result<BenchConfig, RbenchError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let config: BenchConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Write a [`BenchConfig`] to disk as pretty-printed JSON.
pub async fn write_config(config: &BenchConfig, path: impl AsRef<Path>) -> Result<(), RbenchError> {
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path.as_ref(), content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::TelemetrySettings;

    fn make_config() -> BenchConfig {
        let mut config = BenchConfig::new(
            vec![
                "https://api.example.com/{tenant}/orders".to_string(),
                "https://api.example.com/health".to_string(),
            ],
            5,
        );
        config.name = "Orders".to_string();
        config.max_parallel = Some(4);
        config
            .url_args
            .insert("tenant".to_string(), "contoso".to_string());
        config.telemetry = Some(TelemetrySettings {
            app_id: "app-123".to_string(),
            api_key: None,
            api_key_env: Some("AI_KEY".to_string()),
            timeframe: "30m".to_string(),
            max_attempts: 10,
            poll_interval_ms: 1000,
            base_url: None,
        });
        config
    }

    #[tokio::test]
    async fn write_then_read_preserves_config() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("bench.json");

        let original = make_config();
        write_config(&original, &path).await.expect("write should succeed");
        let loaded = read_config(&path).await.expect("read should succeed");

        assert_eq!(loaded.name, "Orders");
        assert_eq!(loaded.endpoints, original.endpoints);
        assert_eq!(loaded.iterations, 5);
        assert_eq!(loaded.max_parallel, Some(4));
        assert_eq!(loaded.url_args["tenant"], "contoso");
        let telemetry = loaded.telemetry.expect("telemetry should survive");
        assert_eq!(telemetry.timeframe, "30m");
        assert_eq!(telemetry.api_key_env.as_deref(), Some("AI_KEY"));
    }

    #[tokio::test]
    async fn read_missing_file_is_io_error() {
        let result = read_config("/nonexistent/path/bench.json").await;
        assert!(matches!(result, Err(RbenchError::Io(_))));
    }

    #[tokio::test]
    async fn read_invalid_json_is_serde_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let result = read_config(&path).await;
        assert!(matches!(result, Err(RbenchError::Serde(_))));
    }
}
