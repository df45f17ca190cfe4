//! Command dispatch.
//!
//! A command takes ownership of the loaded log for the length of one
//! invocation and hands back the (possibly changed) log together with what
//! should be shown to the user.

use crate::ops::{self, TimezoneEdit};
use crate::stats::{self, StatRow};
use crate::units::UnitTable;
use crate::view::{self, ViewSpec};
use crate::{Dose, NewDose, Result, StatsMode};

/// One user-level operation on the log
#[derive(Clone, Debug)]
pub enum Command {
    /// Show the current view
    Get,
    Add(NewDose),
    /// Remove the most recently added dose
    Remove,
    RemoveByPosition(i64),
    /// Move the selected doses to another zone, keeping their wall-clock time
    TimezoneChange(String),
    /// Move the selected doses to another zone, keeping their instant
    TimezoneConvert(String),
    /// Re-write the stored files without changing anything
    Save,
    StatTotal,
    StatAverage,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get => "get",
            Command::Add(_) => "add",
            Command::Remove => "rm",
            Command::RemoveByPosition(_) => "rmp",
            Command::TimezoneChange(_) => "change-tz",
            Command::TimezoneConvert(_) => "convert-tz",
            Command::Save => "save",
            Command::StatTotal => "stat-top",
            Command::StatAverage => "stat-avg",
        }
    }

    /// Whether a successful run changes the stored log
    pub fn mutates(&self) -> bool {
        !matches!(
            self,
            Command::Get | Command::StatTotal | Command::StatAverage
        )
    }
}

/// Settings shared by every command in one invocation
#[derive(Clone, Debug)]
pub struct Invocation {
    pub view: ViewSpec,
    pub default_route: String,
    pub units: UnitTable,
}

/// What the user should see after a command
#[derive(Clone, Debug)]
pub enum Report {
    View(Vec<Dose>),
    Stats(Vec<StatRow>),
    /// The log was re-saved unchanged
    Saved,
}

/// Result of running a command
#[derive(Clone, Debug)]
pub struct Execution {
    /// The log after the command, sorted by timestamp
    pub doses: Vec<Dose>,
    /// Whether `doses` must be written back
    pub persist: bool,
    /// Records kept visible in the echoed view: the added or edited doses
    pub bypass: Vec<i64>,
    pub report: Report,
}

/// Run a command against the loaded log
pub fn execute(command: Command, mut doses: Vec<Dose>, inv: &Invocation) -> Result<Execution> {
    tracing::debug!("Executing {} on {} doses", command.name(), doses.len());
    let persist = command.mutates();
    let mut bypass = Vec::new();

    match command {
        Command::Get => {}
        Command::Add(new) => {
            bypass.push(ops::add(&mut doses, new, &inv.default_route)?);
        }
        Command::Remove => {
            ops::remove_last_added(&mut doses)?;
        }
        Command::RemoveByPosition(position) => {
            ops::remove_by_position(&mut doses, position)?;
        }
        Command::TimezoneChange(tz) => {
            bypass = edit_selected(&mut doses, inv, &tz, TimezoneEdit::Change)?;
        }
        Command::TimezoneConvert(tz) => {
            bypass = edit_selected(&mut doses, inv, &tz, TimezoneEdit::Convert)?;
        }
        Command::Save => {
            return Ok(Execution {
                doses,
                persist,
                bypass,
                report: Report::Saved,
            });
        }
        Command::StatTotal => return Ok(report_stats(doses, inv, StatsMode::Total)),
        Command::StatAverage => return Ok(report_stats(doses, inv, StatsMode::Average)),
    }

    let shown = view::apply_owned(&doses, &inv.view.with_bypass(&bypass));
    Ok(Execution {
        doses,
        persist,
        bypass,
        report: Report::View(shown),
    })
}

/// Statistics use every dose that passes the filter; the window is ignored
fn report_stats(doses: Vec<Dose>, inv: &Invocation, mode: StatsMode) -> Execution {
    let rows = stats::aggregate(view::filtered(&doses, &inv.view), mode, &inv.units);
    Execution {
        doses,
        persist: false,
        bypass: Vec::new(),
        report: Report::Stats(rows),
    }
}

/// Timezone edits apply to exactly the doses the current view would show;
/// returns the edited positions
fn edit_selected(
    doses: &mut Vec<Dose>,
    inv: &Invocation,
    timezone: &str,
    edit: TimezoneEdit,
) -> Result<Vec<i64>> {
    let positions: Vec<i64> = view::apply(doses, &inv.view)
        .iter()
        .map(|dose| dose.position)
        .collect();
    ops::edit_timezone(doses, &positions, timezone, edit)?;
    Ok(positions)
}
