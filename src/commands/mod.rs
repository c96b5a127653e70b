pub mod events;
pub mod month;

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use icsview_core::{ExpansionWindow, NormalizedOccurrence, Tz, expand_all, parse_document};
use tracing::debug;

use crate::config::{self, Config};
use crate::source::Source;

/// Everything a view needs, resolved from flags with config as fallback.
pub struct ViewOptions {
    pub source: Source,
    pub timezone: Tz,
    pub now: DateTime<Tz>,
    pub horizon: TimeDelta,
    pub timeout: Duration,
}

impl ViewOptions {
    pub fn resolve(
        cfg: &Config,
        source: Option<&str>,
        tz: Option<&str>,
        now: Option<&str>,
        horizon_days: Option<i64>,
    ) -> Result<Self> {
        let source = source
            .or(cfg.default_source.as_deref())
            .map(Source::parse)
            .ok_or_else(|| {
                anyhow!(
                    "No calendar source given.\n\n\
                    Pass a file, URL or `-` for stdin, or set default_source in {}",
                    config::config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "config.toml".to_string())
                )
            })?;

        let timezone = match tz {
            Some(name) => config::parse_timezone(name)?,
            None => cfg.target_timezone()?,
        };

        let now = match now {
            Some(s) => DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("Invalid --now '{}', expected RFC 3339", s))?
                .with_timezone(&timezone),
            None => Utc::now().with_timezone(&timezone),
        };

        let days = horizon_days.unwrap_or(cfg.horizon_days);
        if days <= 0 {
            anyhow::bail!("--days must be positive, got {}", days);
        }

        Ok(ViewOptions {
            source,
            timezone,
            now,
            horizon: TimeDelta::days(days),
            timeout: Duration::from_secs(cfg.request_timeout_secs),
        })
    }

    pub fn window(&self) -> ExpansionWindow {
        ExpansionWindow::from_now(self.now, self.horizon)
    }
}

/// Read, parse and expand the configured calendar.
pub async fn load_occurrences(opts: &ViewOptions) -> Result<Vec<NormalizedOccurrence>> {
    let content = opts.source.read(opts.timeout).await?;
    let records = parse_document(&content).context("Failed to parse calendar")?;

    let window = opts.window();
    debug!(
        lower = %window.lower_bound,
        upper = %window.upper_bound,
        "Expansion window"
    );

    Ok(expand_all(&records, &window, opts.timezone))
}
