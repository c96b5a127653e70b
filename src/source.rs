//! Where a calendar document comes from: a file, stdin, or a URL.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::header::CONTENT_TYPE;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
    Stdin,
}

impl Source {
    /// Interpret a command-line argument. `webcal://` feeds are fetched over https.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Source::Stdin
        } else if let Some(rest) = arg.strip_prefix("webcal://") {
            Source::Url(format!("https://{}", rest))
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            Source::Url(arg.to_string())
        } else {
            Source::File(PathBuf::from(arg))
        }
    }

    /// Read the whole document as text.
    pub async fn read(&self, timeout: Duration) -> Result<String> {
        match self {
            Source::Url(url) => fetch_calendar(url, timeout).await,
            Source::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read calendar file at {}", path.display())),
            Source::Stdin => std::io::read_to_string(std::io::stdin())
                .context("Failed to read calendar from stdin"),
        }
    }
}

/// Download an ICS document, insisting on a text/calendar response.
async fn fetch_calendar(url: &str, timeout: Duration) -> Result<String> {
    info!(url, "Fetching ICS data");

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| {
            let err = if e.is_timeout() {
                anyhow!(
                    "Timeout error (>{}s) when fetching ICS from {}",
                    timeout.as_secs(),
                    url
                )
            } else {
                anyhow!("Error fetching ICS from {}: {}", url, e)
            };
            error!("{}", err);
            err
        })?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !is_calendar_content_type(&content_type) {
        error!(content_type, url, "Unexpected content type");
        bail!(
            "Expected 'text/calendar' content type, but received '{}'. Is the URL correct?",
            content_type
        );
    }

    info!(content_type, "Fetched ICS data");

    response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {}", url))
}

pub fn is_calendar_content_type(content_type: &str) -> bool {
    content_type.to_lowercase().contains("text/calendar")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_kinds() {
        assert_eq!(Source::parse("-"), Source::Stdin);
        assert_eq!(
            Source::parse("https://example.com/cal.ics"),
            Source::Url("https://example.com/cal.ics".to_string())
        );
        assert_eq!(
            Source::parse("webcal://example.com/cal.ics"),
            Source::Url("https://example.com/cal.ics".to_string())
        );
        assert_eq!(
            Source::parse("./team.ics"),
            Source::File(PathBuf::from("./team.ics"))
        );
    }

    #[test]
    fn test_calendar_content_type_check() {
        assert!(is_calendar_content_type("text/calendar; charset=utf-8"));
        assert!(is_calendar_content_type("Text/Calendar"));
        assert!(!is_calendar_content_type("text/html"));
        assert!(!is_calendar_content_type(""));
    }

    #[tokio::test]
    async fn test_read_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cal.ics");
        std::fs::write(&path, "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n").unwrap();

        let content = Source::File(path)
            .read(Duration::from_secs(1))
            .await
            .expect("Should read file");
        assert!(content.starts_with("BEGIN:VCALENDAR"));
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let err = Source::File(PathBuf::from("/nonexistent/cal.ics"))
            .read(Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/cal.ics"));
    }
}
