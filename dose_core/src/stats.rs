//! Unit-normalized statistics over the dose log.
//!
//! Each substance gets one [`StatRow`]. Amounts with a canonical factor are
//! summed in micrograms-equivalent and converted back into the first unit
//! recorded for that substance; amounts without one (literal millilitres,
//! counts, bare numbers) are only summed with amounts in the same unit. A
//! synthetic Total/Average row is appended after the ranked rows.

use crate::dosage::parse_dosage;
use crate::ops::is_greek;
use crate::units::{DoseUnit, UnitTable, WeightUnit};
use crate::{Dose, StatsMode};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One aggregated line of the statistics table
#[derive(Clone, Debug, PartialEq)]
pub struct StatRow {
    pub drug: String,
    pub total_doses: u64,
    /// Amount in `unit`
    pub total_amount: f64,
    /// Display unit
    pub unit: DoseUnit,
    /// First non-default unit recorded for this substance
    pub original_unit: Option<DoseUnit>,
    /// Raw token text shown when `unit` has no label of its own
    pub fallback_label: String,
    /// Summed micrograms-equivalent, zero when the row has no canonical basis
    pub canonical_amount: f64,
}

impl StatRow {
    /// Unit label, or the captured raw token when the unit has none
    pub fn unit_label(&self) -> &str {
        match self.unit.label() {
            "" => &self.fallback_label,
            label => label,
        }
    }

    /// Promote weight totals up the ladder while they are ≥ 1000
    fn promote(&mut self) {
        while let DoseUnit::Weight(weight) = self.unit {
            match weight.next() {
                Some(next) if self.total_amount >= 1000.0 => {
                    self.total_amount /= 1000.0;
                    self.unit = DoseUnit::Weight(next);
                }
                _ => break,
            }
        }
    }
}

/// Running totals for one substance (or the summary row)
#[derive(Debug, Default)]
struct Tally {
    doses: u64,
    canonical: f64,
    native: HashMap<DoseUnit, f64>,
    original_unit: Option<DoseUnit>,
    label: String,
}

impl Tally {
    /// Record the unit of a parsed dosage; only the first non-default unit sticks
    fn note_unit(&mut self, unit: DoseUnit, token: &str) {
        if self.original_unit.is_some() {
            return;
        }
        if self.label.is_empty() {
            self.label = token.to_string();
        }
        if unit != DoseUnit::Default {
            self.original_unit = Some(unit);
        }
    }

    fn add(&mut self, unit: DoseUnit, amount: f64, table: &UnitTable) {
        match table.canonical_factor(unit) {
            Some(factor) => self.canonical += amount * factor,
            None => *self.native.entry(unit).or_insert(0.0) += amount,
        }
    }

    fn finish(self, drug: String, mode: StatsMode, table: &UnitTable) -> StatRow {
        let basis = self.original_unit.unwrap_or(DoseUnit::Default);

        let (mut total_amount, canonical_amount) = match table.canonical_factor(basis) {
            Some(factor) => (self.canonical / factor, self.canonical),
            None => (self.native.get(&basis).copied().unwrap_or(0.0), 0.0),
        };

        if mode == StatsMode::Average && self.doses > 0 {
            total_amount /= self.doses as f64;
        }

        let mut row = StatRow {
            drug,
            total_doses: self.doses,
            total_amount,
            unit: basis,
            original_unit: self.original_unit,
            fallback_label: self.label,
            canonical_amount,
        };
        row.promote();
        row
    }
}

fn starts_with_greek(name: &str) -> bool {
    name.chars().next().is_some_and(is_greek)
}

/// Ranking of substance rows, least used first
fn rank(a: &StatRow, b: &StatRow) -> Ordering {
    a.total_doses
        .cmp(&b.total_doses)
        .then_with(|| a.canonical_amount.total_cmp(&b.canonical_amount))
        .then_with(|| starts_with_greek(&b.drug).cmp(&starts_with_greek(&a.drug)))
        .then_with(|| a.drug.cmp(&b.drug))
}

/// Aggregate already-filtered doses into ranked rows plus a summary row
///
/// Unparseable dosages still count as doses but add nothing to the amount.
pub fn aggregate<'a, I>(doses: I, mode: StatsMode, table: &UnitTable) -> Vec<StatRow>
where
    I: IntoIterator<Item = &'a Dose>,
{
    let mut tallies: HashMap<String, Tally> = HashMap::new();
    let mut summary = Tally::default();
    let mut skipped = 0usize;

    for dose in doses {
        let tally = tallies.entry(dose.drug.clone()).or_default();
        tally.doses += 1;
        summary.doses += 1;

        let Ok(parsed) = parse_dosage(&dose.dosage) else {
            skipped += 1;
            continue;
        };

        let unit = table.resolve(&dose.drug, parsed.token);
        tally.note_unit(unit, parsed.token);

        if parsed.amount == 0.0 {
            continue;
        }

        tally.add(unit, parsed.amount, table);

        // The summary row sums everything convertible in micrograms
        match table.canonical_factor(unit) {
            Some(factor) => {
                let micrograms = DoseUnit::Weight(WeightUnit::Microgram);
                summary.note_unit(micrograms, parsed.token);
                summary.add(micrograms, parsed.amount * factor, table);
            }
            None => {
                summary.note_unit(unit, parsed.token);
                summary.add(unit, parsed.amount, table);
            }
        }
    }

    if summary.canonical > 0.0 {
        summary.original_unit = Some(DoseUnit::Weight(WeightUnit::Microgram));
    }

    tracing::debug!(
        "Aggregated {} doses across {} substances ({} without a parseable amount)",
        summary.doses,
        tallies.len(),
        skipped
    );

    let mut rows: Vec<StatRow> = tallies
        .into_iter()
        .map(|(drug, tally)| tally.finish(drug, mode, table))
        .collect();
    rows.sort_by(rank);

    rows.push(summary.finish(mode.summary_label().to_string(), mode, table));
    rows
}
