//! Mutating operations on the dose log.
//!
//! The log is kept sorted by timestamp. Every operation that changes it
//! leaves it sorted again, and positions are never reassigned.

use crate::{Dose, Error, NewDose, Result};
use chrono::{DateTime, FixedOffset, TimeZone};
use chrono_tz::Tz;
use std::collections::HashMap;

/// Position → index lookup, built once per invocation
pub struct PositionIndex {
    indices: HashMap<i64, usize>,
}

impl PositionIndex {
    pub fn build(doses: &[Dose]) -> Self {
        let indices = doses
            .iter()
            .enumerate()
            .map(|(index, dose)| (dose.position, index))
            .collect();
        Self { indices }
    }

    pub fn get(&self, position: i64) -> Option<usize> {
        self.indices.get(&position).copied()
    }
}

/// Resolve an IANA timezone name
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::UnknownTimezone(name.to_string()))
}

/// Timezone of the chronologically latest dose, used when adding without one
pub fn latest_timezone(doses: &[Dose]) -> Option<&str> {
    doses
        .last()
        .map(|dose| dose.timezone.as_str())
        .filter(|tz| !tz.is_empty())
}

/// Highest position in the log and its index
pub fn last_added(doses: &[Dose]) -> Option<(i64, usize)> {
    doses
        .iter()
        .enumerate()
        .max_by_key(|(_, dose)| dose.position)
        .map(|(index, dose)| (dose.position, index))
}

/// Position the next added dose will receive
pub fn next_position(doses: &[Dose]) -> i64 {
    last_added(doses).map_or(0, |(position, _)| position + 1)
}

/// Stable sort by instant, so equal timestamps keep insertion order
pub fn sort_chronologically(doses: &mut [Dose]) {
    doses.sort_by_key(|dose| dose.timestamp.timestamp());
}

/// Whether a character is a Greek letter
///
/// Covers the Greek and Coptic block minus the Coptic letters
/// (U+03E2..=U+03EF), plus Greek Extended.
pub fn is_greek(c: char) -> bool {
    matches!(
        c,
        '\u{0370}'..='\u{03E1}' | '\u{03F0}'..='\u{03FF}' | '\u{1F00}'..='\u{1FFF}'
    )
}

/// Normalize the case of a drug or route name
///
/// Names starting with a lowercase letter are title-cased word by word
/// (`"kratom"` → `"Kratom"`). Anything else, including names that start with
/// a Greek letter such as `"α-PHP"`, is kept as typed.
pub fn normalize_name(name: &str) -> String {
    let Some(first) = name.chars().next() else {
        return String::new();
    };
    if is_greek(first) || !first.is_lowercase() {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Normalize a typed dosage: micro and delta signs to Greek, `ml` to `mL`
pub fn normalize_dosage(dosage: &str) -> String {
    let dosage = dosage.replace('µ', "μ").replace('∆', "Δ");
    match dosage.strip_suffix("ml") {
        Some(amount) => format!("{}mL", amount),
        None => dosage,
    }
}

/// Add a dose and return its position
pub fn add(doses: &mut Vec<Dose>, new: NewDose, default_route: &str) -> Result<i64> {
    let drug = new.drug.trim();
    if drug.is_empty() {
        return Err(Error::MissingField("drug"));
    }

    let route = match new.route.as_deref().map(str::trim) {
        Some(route) if !route.is_empty() => normalize_name(route),
        _ => default_route.to_string(),
    };

    let position = next_position(doses);
    let mut dose = Dose {
        position,
        timestamp: new.timestamp,
        timezone: new.timezone,
        date: String::new(),
        time: String::new(),
        dosage: normalize_dosage(new.dosage.trim()),
        drug: normalize_name(drug),
        route,
        note: new.note,
    };
    dose.refresh_local_fields();

    tracing::info!("Adding {} at position {}", dose.drug, position);
    doses.push(dose);
    sort_chronologically(doses);
    Ok(position)
}

/// Remove the most recently added dose (highest position)
pub fn remove_last_added(doses: &mut Vec<Dose>) -> Result<Dose> {
    let (position, index) = last_added(doses).ok_or(Error::EmptyLog("remove"))?;
    tracing::info!("Removing last added dose at position {}", position);
    Ok(doses.remove(index))
}

/// Remove the dose with the given position
pub fn remove_by_position(doses: &mut Vec<Dose>, position: i64) -> Result<Dose> {
    if doses.is_empty() {
        return Err(Error::EmptyLog("remove"));
    }
    let index = PositionIndex::build(doses)
        .get(position)
        .ok_or(Error::PositionNotFound(position))?;
    tracing::info!("Removing dose at position {}", position);
    Ok(doses.remove(index))
}

/// How a timezone edit treats the existing timestamp
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimezoneEdit {
    /// Keep the wall-clock date and time, move the instant
    Change,
    /// Keep the instant, move the wall-clock date and time
    Convert,
}

fn reinterpret(timestamp: DateTime<FixedOffset>, tz: &Tz) -> Result<DateTime<FixedOffset>> {
    let local = timestamp.naive_local();
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| {
            Error::TimeParse(format!("{} does not exist in {}", local, tz.name()))
        })
}

/// Apply a timezone edit to the doses at the given positions
///
/// Every target is resolved before anything is modified, so a missing
/// position leaves the log untouched. Returns the number of doses edited.
pub fn edit_timezone(
    doses: &mut Vec<Dose>,
    positions: &[i64],
    timezone: &str,
    edit: TimezoneEdit,
) -> Result<usize> {
    if doses.is_empty() {
        return Err(Error::EmptyLog("modify"));
    }
    let tz = resolve_timezone(timezone)?;

    let index = PositionIndex::build(doses);
    let targets = positions
        .iter()
        .map(|&position| index.get(position).ok_or(Error::PositionNotFound(position)))
        .collect::<Result<Vec<usize>>>()?;

    let mut updated = Vec::with_capacity(targets.len());
    for &i in &targets {
        let timestamp = match edit {
            TimezoneEdit::Change => reinterpret(doses[i].timestamp, &tz)?,
            TimezoneEdit::Convert => doses[i].timestamp.with_timezone(&tz).fixed_offset(),
        };
        updated.push((i, timestamp));
    }

    for (i, timestamp) in updated {
        let dose = &mut doses[i];
        dose.timestamp = timestamp;
        dose.timezone = timezone.to_string();
        dose.refresh_local_fields();
    }

    tracing::info!("{:?} timezone to {} for {} doses", edit, timezone, targets.len());
    sort_chronologically(doses);
    Ok(targets.len())
}
