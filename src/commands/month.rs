use anyhow::{Result, anyhow};
use chrono::Datelike;

use crate::commands::{ViewOptions, load_occurrences};
use crate::render::{first_of_month, group_by_date, render_month};

pub async fn run(opts: ViewOptions, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let year = year.unwrap_or_else(|| opts.now.year());
    let month = month.unwrap_or_else(|| opts.now.month());

    let first = first_of_month(year, month).ok_or_else(|| {
        anyhow!(
            "Invalid year or month specified: {}-{:02}",
            year,
            month
        )
    })?;

    let occurrences = load_occurrences(&opts).await?;
    let groups = group_by_date(&occurrences);

    for line in render_month(first, &groups, opts.now.date_naive()) {
        println!("{}", line);
    }

    Ok(())
}
