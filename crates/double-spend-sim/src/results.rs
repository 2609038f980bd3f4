/*!
Records and tables produced by running scenarios

# Working with [`ScenarioResult`]

A [`ScenarioResult`] keeps every trial of a scenario in the order the trials
were run, together with the running win rate after each trial. Large sweeps
should hand results to a [`ResultSink`](crate::sink::ResultSink) as soon as
they are produced rather than keeping them around.

## Examples

Building a summary table from a small sweep:

```
use double_spend_sim::prelude::*;

let sim = Simulation::builder()
    .race(SplitStreamRace::new())
    .trials(200)
    .seed(7)
    .build()
    .unwrap();

let report = ScenarioSweep::new([0.2, 0.4], [3600.0, 7200.0])
    .tally(&sim)
    .unwrap();

let table = report.table().format(Format::CSV);
println!("{}", table);
```
*/

use std::{fmt::Display, io, time::Duration};

use crate::{params::Parameters, race::TrialOutcome};

/// Floating point precision of summary tables.
pub const FLOAT_PRECISION_DIGITS: usize = 6;

/// Cumulative win count over a sequence of trials.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunningStatistics {
    wins: u64,
    trials: u64,
}

impl RunningStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the next trial and returns the win rate over all trials so
    /// far.
    #[inline]
    pub fn record(&mut self, won: bool) -> f64 {
        self.trials += 1;
        self.wins += u64::from(won);

        self.win_rate()
    }

    pub fn wins(&self) -> u64 {
        self.wins
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// Returns `0.0` before any trial has been recorded.
    pub fn win_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.wins as f64 / self.trials as f64
        }
    }
}

/// One trial of a scenario and the running win rate after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialRecord {
    pub win_rate: f64,
    pub outcome: TrialOutcome,
}

impl TrialRecord {
    /// Placeholder for a trial that has not been run yet.
    pub(crate) fn pending() -> Self {
        Self { win_rate: 0.0, outcome: TrialOutcome::loss(0.0, 0) }
    }
}

/// Every trial of a completed scenario, in trial order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    pub params: Parameters,
    /// Name of the [`Race`](crate::race::Race) policy that produced the
    /// trials.
    pub race: String,
    pub records: Vec<TrialRecord>,
    stats: RunningStatistics,
}

impl ScenarioResult {
    /// Computes the running win rate over `outcomes`, which must be given in
    /// trial order.
    pub fn from_outcomes<I>(params: Parameters, race: String, outcomes: I) -> Self
    where
        I: IntoIterator<Item = TrialOutcome>,
    {
        let records = outcomes
            .into_iter()
            .map(|outcome| TrialRecord { win_rate: 0.0, outcome })
            .collect();

        Self::from_records(params, race, records)
    }

    /// Overwrites the win rate of every record with the running win rate,
    /// reusing the allocation. `records` must be given in trial order.
    pub fn from_records(params: Parameters, race: String, mut records: Vec<TrialRecord>) -> Self {
        let mut stats = RunningStatistics::new();
        for record in records.iter_mut() {
            record.win_rate = stats.record(record.outcome.won);
        }

        Self { params, race, records, stats }
    }

    pub fn trials(&self) -> u64 {
        self.stats.trials()
    }

    pub fn wins(&self) -> u64 {
        self.stats.wins()
    }

    /// Win rate over all trials of the scenario.
    pub fn win_rate(&self) -> f64 {
        self.stats.win_rate()
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            params: self.params,
            race: self.race.clone(),
            trials: self.trials(),
            wins: self.wins(),
        }
    }

    /// Writes one line per trial: running win rate, `1`/`0` for a win, finish
    /// time and attacker height, comma-separated without a header.
    pub fn write_csv<W: io::Write>(&self, mut w: W) -> io::Result<()> {
        for TrialRecord { win_rate, outcome } in &self.records {
            writeln!(
                w,
                "{},{},{},{}",
                win_rate,
                u8::from(outcome.won),
                outcome.finish_time,
                outcome.attacker_height
            )?;
        }

        Ok(())
    }
}

/// Win count of a scenario without its individual trials.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSummary {
    pub params: Parameters,
    pub race: String,
    pub trials: u64,
    pub wins: u64,
}

impl ScenarioSummary {
    pub fn win_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.wins as f64 / self.trials as f64
        }
    }
}

/// Outcome of running a [`ScenarioSweep`](crate::sweep::ScenarioSweep).
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Summaries of all completed scenarios, in sweep order.
    pub summaries: Vec<ScenarioSummary>,
    /// Whether the sweep stopped before its last scenario.
    pub cancelled: bool,
    /// Wall time spent on the sweep.
    pub elapsed: Duration,
}

impl SweepReport {
    /// Creates a [`ResultsTable`] with one row per completed scenario.
    pub fn table(&self) -> ResultsTable {
        ResultsTable::new(&self.summaries)
    }
}

/// Describes the appearance of a [`ResultsTable`] table as given by its
/// [`Display`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub enum Format {
    /// Comma-separated, without extra whitespace.
    CSV,
    /// Human-readable.
    #[default]
    PrettyPrint,
}

/// Summary of a set of scenarios, one row per scenario. The table is given by
/// the struct's [`Display`] implementation, as specified by its [`Format`].
pub struct ResultsTable {
    format: Format,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultsTable {
    const SEPARATOR_VERTICAL: char = '|';
    const SEPARATOR_HORIZONTAL: char = '-';

    pub fn new<'a, I>(summaries: I) -> Self
    where
        I: IntoIterator<Item = &'a ScenarioSummary>,
    {
        let header = Column::ALL.iter().map(Column::to_string).collect();
        let rows = summaries
            .into_iter()
            .map(|summary| {
                Column::ALL.iter().map(|col| col.get_value(summary).to_string()).collect()
            })
            .collect();

        Self { format: Format::default(), header, rows }
    }

    /// Specify the [`Format`] of the results table.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;

        self
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn lines(&self) -> impl Iterator<Item = &[String]> + '_ {
        std::iter::once(self.header.as_slice()).chain(self.rows.iter().map(Vec::as_slice))
    }

    /// Widest cell of each column, header included.
    fn column_widths(&self) -> Vec<usize> {
        self.lines().fold(vec![0; self.header.len()], |mut widths, cells| {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.len());
            }

            widths
        })
    }

    fn write_padded(
        f: &mut std::fmt::Formatter<'_>,
        cells: &[String],
        widths: &[usize],
    ) -> std::fmt::Result {
        for (cell, &width) in cells.iter().zip(widths) {
            write!(f, " {:width$} {}", cell, Self::SEPARATOR_VERTICAL)?;
        }

        Ok(())
    }
}

impl Display for ResultsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.format {
            Format::CSV => {
                for (i, cells) in self.lines().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", cells.join(","))?;
                }
            }
            Format::PrettyPrint => {
                let widths = self.column_widths();
                let rule_len: usize = widths.iter().map(|w| w + 3).sum();

                Self::write_padded(f, &self.header, &widths)?;
                write!(f, "\n{}", Self::SEPARATOR_HORIZONTAL.to_string().repeat(rule_len))?;

                for row in &self.rows {
                    writeln!(f)?;
                    Self::write_padded(f, row, &widths)?;
                }
            }
        }

        Ok(())
    }
}

/// Type of column that can appear in a summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Race,
    AttackerPower,
    TimeBudgetMinutes,
    Depth,
    Trials,
    Wins,
    WinRate,
}

/// Value which corresponds to a [`Column`].
#[derive(Debug, Clone)]
enum ColumnValue {
    Text(String),
    Int(u64),
    Float(f64),
}

impl Column {
    // Order of columns in results tables
    const ALL: [Column; 7] = [
        Column::Race,
        Column::AttackerPower,
        Column::TimeBudgetMinutes,
        Column::Depth,
        Column::Trials,
        Column::Wins,
        Column::WinRate,
    ];

    fn get_value(&self, summary: &ScenarioSummary) -> ColumnValue {
        match &self {
            Self::Race => ColumnValue::Text(summary.race.clone()),
            Self::AttackerPower => ColumnValue::Float(summary.params.beta),
            Self::TimeBudgetMinutes => ColumnValue::Float(summary.params.time_budget / 60.0),
            Self::Depth => ColumnValue::Int(u64::from(summary.params.depth)),
            Self::Trials => ColumnValue::Int(summary.trials),
            Self::Wins => ColumnValue::Int(summary.wins),
            Self::WinRate => ColumnValue::Float(summary.win_rate()),
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::Race => write!(f, "Race"),
            Self::AttackerPower => write!(f, "Attacker Power"),
            Self::TimeBudgetMinutes => write!(f, "Time Budget (min)"),
            Self::Depth => write!(f, "Confirmation Depth"),
            Self::Trials => write!(f, "Trials"),
            Self::Wins => write!(f, "Attacker Wins"),
            Self::WinRate => write!(f, "Win Rate"),
        }
    }
}

impl Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Int(num) => write!(f, "{}", num),
            Self::Float(value) => write!(f, "{:.1$}", value, FLOAT_PRECISION_DIGITS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Format, ResultsTable, RunningStatistics, ScenarioResult, ScenarioSummary, TrialRecord,
    };
    use crate::{params::Parameters, race::TrialOutcome};

    fn outcomes(wins: &[bool]) -> Vec<TrialOutcome> {
        wins.iter()
            .map(|&won| {
                if won {
                    TrialOutcome::win(1800.0, 6)
                } else {
                    TrialOutcome::loss(3600.0, 2)
                }
            })
            .collect()
    }

    #[test]
    fn running_statistics() {
        let mut stats = RunningStatistics::new();
        assert_eq!(stats.win_rate(), 0.0);

        assert_eq!(stats.record(false), 0.0);
        assert_eq!(stats.record(true), 0.5);
        assert_eq!(stats.record(true), 2.0 / 3.0);
        assert_eq!((stats.wins(), stats.trials()), (2, 3));
    }

    #[test]
    fn win_rate_after_every_trial() {
        let pattern = [true, false, false, true, true, false, true, false];
        let result = ScenarioResult::from_outcomes(
            Parameters::new(0.3, 3600.0),
            "Continuous".into(),
            outcomes(&pattern),
        );

        let mut wins = 0;
        for (i, (record, won)) in result.records.iter().zip(pattern).enumerate() {
            wins += u64::from(won);
            assert_eq!(record.outcome.won, won);
            assert_eq!(record.win_rate, wins as f64 / (i + 1) as f64);
        }
        assert_eq!(result.trials(), 8);
        assert_eq!(result.wins(), 4);
        assert_eq!(result.win_rate(), 0.5);
    }

    #[test]
    fn running_rates_are_filled_in_place() {
        let records: Vec<_> = outcomes(&[true, true, false, false])
            .into_iter()
            .map(|outcome| TrialRecord { win_rate: f64::NAN, outcome })
            .collect();
        let buffer = records.as_ptr();

        let result =
            ScenarioResult::from_records(Parameters::new(0.3, 3600.0), "Continuous".into(), records);

        let rates: Vec<_> = result.records.iter().map(|r| r.win_rate).collect();
        assert_eq!(rates, [1.0, 1.0, 2.0 / 3.0, 0.5]);
        assert_eq!(result.records.as_ptr(), buffer);
        assert_eq!(result.wins(), 2);
    }

    #[test]
    fn csv_rows() {
        let result = ScenarioResult::from_outcomes(
            Parameters::new(0.3, 3600.0),
            "Continuous".into(),
            outcomes(&[false, true]),
        );

        let mut buf = vec![];
        result.write_csv(&mut buf).unwrap();

        assert_eq!(String::from_utf8(buf).unwrap(), "0,0,3600,2\n0.5,1,1800,6\n");
    }

    #[test]
    fn summary_table_csv() {
        let summary = ScenarioSummary {
            params: Parameters::new(0.25, 7200.0),
            race: "Split Stream".into(),
            trials: 4,
            wins: 1,
        };

        let table = ResultsTable::new([&summary]).format(Format::CSV);

        assert_eq!(
            table.to_string(),
            "Race,Attacker Power,Time Budget (min),Confirmation Depth,Trials,Attacker Wins,Win Rate\n\
             Split Stream,0.250000,120.000000,6,4,1,0.250000"
        );
    }

    #[test]
    fn pretty_table_has_header_rule_and_rows() {
        let summary = ScenarioSummary {
            params: Parameters::new(0.1, 3600.0),
            race: "Continuous".into(),
            trials: 10,
            wins: 0,
        };

        let table = ResultsTable::new([&summary, &summary]).to_string();
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Win Rate"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].contains("Continuous"));

        // every line is padded to the same width
        assert_eq!(lines[1].len(), lines[0].len());
        assert_eq!(lines[2].len(), lines[0].len());
        assert_eq!(lines[3], lines[2]);
    }
}
