//! Aggregated fit results and the output table.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use ndarray::{Array1, ArrayView1};

use crate::data::format_float;
use crate::error::{DcmFitError, Result};
use crate::fit::FitOutcome;
use crate::parameters::{FitParameters, RESONANCE_COUNT};

/// Fits of every time-delay row of one intensity, in ascending time order.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityResults {
    pub intensity: f64,
    pub params: Vec<FitParameters>,
    pub errors: Vec<FitParameters>,
}

/// Fitted parameters keyed by time delay and intensity.
///
/// Rows are stored in the reverse of the spectrum row order, which restores
/// ascending time delay for data recorded late-to-early. Standard errors are
/// kept alongside the values but not written out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    time: Option<Array1<f64>>,
    intensities: Vec<IntensityResults>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the row fits of one intensity.
    ///
    /// `time_delays` and `rows` are in spectrum row order.
    ///
    /// # Errors
    ///
    /// * `DcmFitError::DataFormat` if the row count differs from the number of
    ///   time delays, or the time axis differs from one already in the table
    /// * `DcmFitError::InvalidInput` if the intensity is already present
    pub fn insert(&mut self, intensity: f64, time_delays: ArrayView1<f64>, rows: &[FitOutcome]) -> Result<()> {
        if rows.len() != time_delays.len() {
            return Err(DcmFitError::DataFormat(format!(
                "Intensity {}: {} fits for {} time delays",
                format_float(intensity),
                rows.len(),
                time_delays.len()
            )));
        }
        if self.get(intensity).is_some() {
            return Err(DcmFitError::InvalidInput(format!(
                "Intensity {} already has results",
                format_float(intensity)
            )));
        }

        let time: Array1<f64> = time_delays.iter().rev().copied().collect();
        match &self.time {
            Some(existing) if *existing != time => {
                return Err(DcmFitError::DataFormat(format!(
                    "Intensity {} has a different time-delay axis",
                    format_float(intensity)
                )));
            }
            Some(_) => {}
            None => self.time = Some(time),
        }

        self.intensities.push(IntensityResults {
            intensity,
            params: rows.iter().rev().map(|r| r.params).collect(),
            errors: rows.iter().rev().map(|r| r.std_errors).collect(),
        });
        Ok(())
    }

    /// Ascending time-delay axis, if any intensity has been added.
    pub fn time(&self) -> Option<ArrayView1<f64>> {
        self.time.as_ref().map(|t| t.view())
    }

    pub fn intensities(&self) -> &[IntensityResults] {
        &self.intensities
    }

    pub fn get(&self, intensity: f64) -> Option<&IntensityResults> {
        self.intensities.iter().find(|r| r.intensity == intensity)
    }

    /// Standard errors for `intensity`, in ascending time order.
    pub fn errors(&self, intensity: f64) -> Option<&[FitParameters]> {
        self.get(intensity).map(|r| r.errors.as_slice())
    }

    pub fn len(&self) -> usize {
        self.intensities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensities.is_empty()
    }

    /// Output header: `time`, then `T{n}_z0{I}`, `T{n}_phi{I}`, `T{n}_gam{I}`
    /// for each intensity `I` and line `n`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec!["time".to_string()];
        for entry in &self.intensities {
            let label = format_float(entry.intensity);
            for n in 1..=RESONANCE_COUNT {
                names.push(format!("T{}_z0{}", n, label));
                names.push(format!("T{}_phi{}", n, label));
                names.push(format!("T{}_gam{}", n, label));
            }
        }
        names
    }

    /// Write the table as CSV to `path`.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.to_writer(file)
    }

    /// Write the table as CSV.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.column_names())?;

        if let Some(time) = &self.time {
            for (row, t) in time.iter().enumerate() {
                let mut record = vec![format_float(*t)];
                for entry in &self.intensities {
                    for line in &entry.params[row].resonances {
                        record.push(format_float(line.strength));
                        record.push(format_float(line.phase));
                        record.push(format_float(line.width));
                    }
                }
                writer.write_record(&record)?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lm::ConvergenceStatus;
    use crate::parameters::ResonanceParams;
    use ndarray::{array, Array2};

    fn outcome(strength: f64) -> FitOutcome {
        let params = FitParameters::new([ResonanceParams::new(strength, 0.1, 0.12); 3], 0.0);
        FitOutcome {
            params,
            std_errors: FitParameters::new([ResonanceParams::new(0.01, 0.02, 0.003); 3], 0.1),
            covariance: Array2::zeros((10, 10)),
            correlation: Array2::eye(10),
            cost: 0.0,
            iterations: 3,
            func_evals: 40,
            status: ConvergenceStatus::FunctionValueConvergence,
        }
    }

    #[test]
    fn test_rows_are_reversed() {
        let mut table = ResultTable::new();
        let rows = vec![outcome(3.0), outcome(2.0), outcome(1.0)];
        table.insert(1.3, array![8.0, 4.0, 0.0].view(), &rows).unwrap();

        assert_eq!(table.time().unwrap().to_vec(), vec![0.0, 4.0, 8.0]);
        let stored = table.get(1.3).unwrap();
        assert_eq!(stored.params[0].resonances[0].strength, 1.0);
        assert_eq!(stored.params[2].resonances[0].strength, 3.0);
        assert_eq!(table.errors(1.3).unwrap().len(), 3);
    }

    #[test]
    fn test_column_names() {
        let mut table = ResultTable::new();
        table.insert(2.0, array![1.0].view(), &[outcome(1.0)]).unwrap();
        table.insert(1.3, array![1.0].view(), &[outcome(1.0)]).unwrap();

        let names = table.column_names();
        assert_eq!(names.len(), 1 + 2 * 9);
        assert_eq!(names[0], "time");
        assert_eq!(&names[1..4], &["T1_z02.0", "T1_phi2.0", "T1_gam2.0"]);
        assert_eq!(names[7], "T3_z02.0");
        assert_eq!(names[10], "T1_z01.3");
    }

    #[test]
    fn test_rejects_mismatched_time_axis() {
        let mut table = ResultTable::new();
        table.insert(1.3, array![2.0, 1.0].view(), &[outcome(1.0), outcome(1.0)]).unwrap();

        let result = table.insert(1.6, array![3.0, 1.0].view(), &[outcome(1.0), outcome(1.0)]);
        assert!(matches!(result, Err(DcmFitError::DataFormat(_))));

        let result = table.insert(1.6, array![2.0, 1.0].view(), &[outcome(1.0)]);
        assert!(matches!(result, Err(DcmFitError::DataFormat(_))));

        let result = table.insert(1.3, array![2.0, 1.0].view(), &[outcome(1.0), outcome(1.0)]);
        assert!(matches!(result, Err(DcmFitError::InvalidInput(_))));
    }

    #[test]
    fn test_csv_output() {
        let mut table = ResultTable::new();
        table.insert(1.6, array![5.0, -5.0].view(), &[outcome(2.0), outcome(1.5)]).unwrap();

        let mut buffer = Vec::new();
        table.to_writer(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("time,T1_z01.6,T1_phi1.6,T1_gam1.6,T2_z01.6"));
        assert!(lines[1].starts_with("-5.0,1.5,0.1,0.12,"));
        assert!(lines[2].starts_with("5.0,2.0,0.1,0.12,"));
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let mut buffer = Vec::new();
        ResultTable::new().to_writer(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "time\n");
    }
}
