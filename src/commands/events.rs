use anyhow::{Context, Result};
use icsview_core::{ExpansionWindow, LocalizedTime, NormalizedOccurrence};

use crate::commands::{ViewOptions, load_occurrences};
use crate::render::{group_by_date, render_agenda};

pub async fn run(opts: ViewOptions, json: bool) -> Result<()> {
    let occurrences = load_occurrences(&opts).await?;
    let upcoming = upcoming(occurrences, &opts.window());

    if json {
        let out = serde_json::to_string_pretty(&upcoming)
            .context("Failed to serialize occurrences")?;
        println!("{}", out);
        return Ok(());
    }

    let groups = group_by_date(&upcoming);
    for line in render_agenda(&groups, opts.now.date_naive()) {
        println!("{}", line);
    }

    Ok(())
}

/// Occurrences starting inside the window, in start order.
///
/// Single events are not bounded by expansion, so they are filtered here.
fn upcoming(
    occurrences: Vec<NormalizedOccurrence>,
    window: &ExpansionWindow,
) -> Vec<NormalizedOccurrence> {
    let (first, last) = window.dates();

    let mut upcoming: Vec<NormalizedOccurrence> = occurrences
        .into_iter()
        .filter(|o| match &o.start {
            Some(LocalizedTime::Instant(dt)) => window.contains(dt),
            Some(LocalizedTime::Date(d)) => *d >= first && *d <= last,
            None => false,
        })
        .collect();

    upcoming.sort_by_key(|o| {
        (
            o.date(),
            o.start.as_ref().and_then(LocalizedTime::as_instant).copied(),
        )
    });

    upcoming
}
