//! Rendering of views and statistics tables.

use crate::stats::StatRow;
use crate::{Dose, RenderOptions, Result};
use serde::Serialize;

/// Width of the amount column in statistics tables
const AMOUNT_WIDTH: usize = 9;

impl Dose {
    /// Render the dose as a single display line
    ///
    /// Regular lines use the record's own zone (`2023/04/01 13:05`); compact
    /// lines use UTC with the original hour offset appended (`2023-04-01 17·05-04`).
    pub fn render(&self, options: &RenderOptions) -> String {
        let note = if !options.ignore_notes && !self.note.is_empty() {
            format!(", Note: {}", self.note)
        } else {
            String::new()
        };

        let dosage = if self.dosage.is_empty() {
            String::new()
        } else {
            format!(" {}", self.dosage)
        };

        let unix = if options.show_unix_epoch {
            format!("{} ", self.timestamp.timestamp())
        } else {
            String::new()
        };

        let when = if options.compact_time {
            format!(
                "{}{}",
                self.timestamp.naive_utc().format("%Y-%m-%d %H·%M"),
                hour_offset(self.timestamp.offset().local_minus_utc())
            )
        } else {
            self.timestamp.format("%Y/%m/%d %H:%M").to_string()
        };

        format!("{unix}{when}{dosage} {}, {}{note}", self.drug, self.route)
    }
}

/// Signed whole-hour offset, e.g. `+00`, `-04`, `+05` for +05:30
fn hour_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    format!("{}{:02}", sign, seconds.abs() / 3600)
}

/// Pretty JSON with four-space indentation and a trailing newline
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| crate::Error::Other(e.to_string()))
}

/// Render an already ordered view, either as JSON or one line per dose
pub fn render_view(doses: &[Dose], json: bool, options: &RenderOptions) -> Result<String> {
    if json {
        return to_json(doses);
    }

    Ok(doses
        .iter()
        .map(|dose| dose.render(options) + "\n")
        .collect())
}

/// Format an amount with two decimals, dropping trailing zeros and a bare dot
pub fn trim_amount(amount: f64) -> String {
    let formatted = format!("{:.2}", amount);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

impl StatRow {
    /// One table line: dose count, amount with unit, drug name
    pub fn format(&self, count_width: usize, amount_width: usize) -> String {
        let label = self.unit_label();

        let count = format!("{:<width$}", self.total_doses, width = count_width);

        let amount = trim_amount(self.total_amount) + label;
        // μ and µ are two bytes but one column wide
        let glyph_adjust = usize::from(label.contains(&['μ', 'µ'][..]));
        let padding = (amount_width + glyph_adjust)
            .saturating_sub(amount.len())
            .max(1);

        format!("{count}{amount}{}{}", " ".repeat(padding), self.drug)
    }
}

/// Render a ranked statistics table, one line per row
///
/// The count column is as wide as the summary row's count plus one.
pub fn render_stats(rows: &[StatRow]) -> String {
    let count_width = rows
        .last()
        .map(|summary| summary.total_doses.to_string().len() + 1)
        .unwrap_or(1);

    rows.iter()
        .map(|row| row.format(count_width, AMOUNT_WIDTH) + "\n")
        .collect()
}

/// JSON shape of a statistics row
#[derive(Serialize)]
struct StatEntry<'a> {
    drug: &'a str,
    doses: u64,
    amount: f64,
    unit: &'a str,
}

/// Render a ranked statistics table as a JSON array
pub fn render_stats_json(rows: &[StatRow]) -> Result<String> {
    let entries: Vec<StatEntry> = rows
        .iter()
        .map(|row| StatEntry {
            drug: &row.drug,
            doses: row.total_doses,
            amount: row.total_amount,
            unit: row.unit_label(),
        })
        .collect();
    to_json(&entries)
}
