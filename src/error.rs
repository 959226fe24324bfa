use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("SLACK_TOKEN environment variable not set")]
    MissingToken,

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("history fetch for #{channel} timed out after {secs}s")]
    HistoryTimeout { channel: String, secs: u64 },

    #[error("no tally bucket for channel #{0}")]
    MissingChannelBucket(String),

    #[error("aggregation task failed: {0}")]
    TaskJoin(String),

    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file at {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonSerialize(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_missing_token_display() {
        let err = AppError::MissingToken;
        assert_eq!(err.to_string(), "SLACK_TOKEN environment variable not set");
    }

    #[test]
    fn test_slack_api_display() {
        let err = AppError::SlackApi("channel_not_found".to_string());
        assert_eq!(err.to_string(), "Slack API error: channel_not_found");
    }

    #[test]
    fn test_history_timeout_display() {
        let err = AppError::HistoryTimeout {
            channel: "general".to_string(),
            secs: 15,
        };
        assert_eq!(
            err.to_string(),
            "history fetch for #general timed out after 15s"
        );
    }

    #[test]
    fn test_missing_channel_bucket_display() {
        let err = AppError::MissingChannelBucket("dev".to_string());
        assert_eq!(err.to_string(), "no tally bucket for channel #dev");
    }

    #[test]
    fn test_task_join_display() {
        let err = AppError::TaskJoin("task panicked".to_string());
        assert_eq!(err.to_string(), "aggregation task failed: task panicked");
    }

    #[test]
    fn test_read_file_display_and_source() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let err = AppError::ReadFile {
            path: "/path/to/settings.toml".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("/path/to/settings.toml"));
        assert!(err.to_string().contains("failed to read file"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_write_file_display_and_source() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let err = AppError::WriteFile {
            path: "/path/to/ranking.json".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("/path/to/ranking.json"));
        assert!(err.to_string().contains("failed to write file"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_serialize_display() {
        let err = AppError::JsonSerialize("invalid utf-8".to_string());
        assert_eq!(err.to_string(), "JSON serialization error: invalid utf-8");
    }

    #[test]
    fn test_toml_parse_display() {
        let err = AppError::TomlParse("invalid toml".to_string());
        assert_eq!(err.to_string(), "TOML parse error: invalid toml");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AppError>();
    }

    #[test]
    fn test_error_debug() {
        let err = AppError::MissingToken;
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("MissingToken"));
    }
}
