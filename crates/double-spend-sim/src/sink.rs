//! Destinations for completed scenario results

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{params::Parameters, results::ScenarioResult};

/// Error returned by a [`ResultSink`] that could not store a result.
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Receives each [`ScenarioResult`] of a sweep as soon as it is complete.
/// The sink takes ownership; the sweep keeps nothing but a summary.
pub trait ResultSink {
    fn accept(&mut self, result: ScenarioResult) -> Result<(), SinkError>;
}

impl ResultSink for Vec<ScenarioResult> {
    fn accept(&mut self, result: ScenarioResult) -> Result<(), SinkError> {
        self.push(result);

        Ok(())
    }
}

/// Writes every result to its own CSV file inside a directory, one line per
/// trial (see [`ScenarioResult::write_csv`]).
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    /// Creates `dir` and any missing parents.
    pub fn create<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path the result for `params` is written to.
    pub fn path_for(&self, params: &Parameters) -> PathBuf {
        self.dir.join(file_name(params))
    }
}

impl ResultSink for CsvDirectory {
    fn accept(&mut self, result: ScenarioResult) -> Result<(), SinkError> {
        let path = self.path_for(&result.params);

        let mut w = BufWriter::new(File::create(&path)?);
        result.write_csv(&mut w)?;
        w.flush()?;

        debug!(path = %path.display(), trials = result.trials(), "wrote scenario");
        Ok(())
    }
}

/// File name of a scenario: `b` followed by the attacker power's digits with
/// the decimal point removed, then `_at` and the time budget in whole
/// minutes. For example, `beta = 0.15` and a two hour budget give
/// `b015_at120.csv`.
pub fn file_name(params: &Parameters) -> String {
    let beta: String = params.beta.to_string().chars().filter(|&c| c != '.').collect();
    let minutes = (params.time_budget / 60.0).trunc() as u64;

    format!("b{}_at{}.csv", beta, minutes)
}
