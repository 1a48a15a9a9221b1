//! Tabular dataset with named columns and optional cells

use std::io::Read;

use crate::models::HeartRecord;
use crate::pipeline::{FEATURE_COLUMNS, LABEL_COLUMN};
use crate::{Error, Result};

/// Cell spellings that mean "no value".
const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "null"];

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(Error::DataShape(format!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse CSV with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(cell).collect());
        }

        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Fail with a data-shape error naming every absent column.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names.iter().copied().filter(|n| !self.has_column(n)).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::DataShape(format!("missing column(s): {}", missing.join(", "))))
        }
    }

    /// Remove a column, returning its cells.
    pub fn take_column(&mut self, name: &str) -> Option<Vec<Option<String>>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Map every row into a record. The label column is optional.
    pub fn records(&self) -> Result<Vec<HeartRecord>> {
        self.require_columns(&FEATURE_COLUMNS)?;
        let label = self.column_index(LABEL_COLUMN);

        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cells = RowCells { table: self, row, index: i };
                Ok(HeartRecord {
                    age: cells.int("Age")?,
                    sex: cells.text("Sex")?,
                    chest_pain_type: cells.text("ChestPainType")?,
                    resting_bp: cells.opt_int("RestingBP")?,
                    cholesterol: cells.opt_int("Cholesterol")?,
                    fasting_bs: cells.int("FastingBS")?,
                    resting_ecg: cells.text("RestingECG")?,
                    max_hr: cells.int("MaxHR")?,
                    exercise_angina: cells.text("ExerciseAngina")?,
                    oldpeak: cells.float("Oldpeak")?,
                    st_slope: cells.text("ST_Slope")?,
                    heart_disease: match label {
                        Some(_) => cells.opt_int(LABEL_COLUMN)?,
                        None => None,
                    },
                })
            })
            .collect()
    }
}

fn cell(raw: &str) -> Option<String> {
    (!MISSING_MARKERS.contains(&raw)).then(|| raw.to_string())
}

struct RowCells<'a> {
    table: &'a Table,
    row: &'a [Option<String>],
    index: usize,
}

impl RowCells<'_> {
    fn raw(&self, column: &str) -> Option<&str> {
        self.table
            .column_index(column)
            .and_then(|i| self.row[i].as_deref())
    }

    fn required(&self, column: &str) -> Result<&str> {
        self.raw(column).ok_or_else(|| {
            Error::Constraint(format!("row {}: {} must not be null", self.index, column))
        })
    }

    fn mismatch(&self, column: &str, value: &str, expected: &str) -> Error {
        Error::Constraint(format!(
            "row {}: {} = {:?} is not {}",
            self.index, column, value, expected
        ))
    }

    fn text(&self, column: &str) -> Result<String> {
        self.required(column).map(String::from)
    }

    fn int(&self, column: &str) -> Result<i32> {
        let value = self.required(column)?;
        parse_int(value).ok_or_else(|| self.mismatch(column, value, "an integer"))
    }

    fn opt_int(&self, column: &str) -> Result<Option<i32>> {
        match self.raw(column) {
            None => Ok(None),
            Some(value) => parse_int(value)
                .map(Some)
                .ok_or_else(|| self.mismatch(column, value, "an integer")),
        }
    }

    fn float(&self, column: &str) -> Result<f64> {
        let value = self.required(column)?;
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.mismatch(column, value, "a number"))
    }
}

/// Accepts `140` and integral floats such as `140.0`.
fn parse_int(value: &str) -> Option<i32> {
    value.parse::<i32>().ok().or_else(|| {
        let f = value.parse::<f64>().ok()?;
        (f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX)).then(|| f as i32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Age,Sex,ChestPainType,RestingBP,Cholesterol,FastingBS,RestingECG,MaxHR,ExerciseAngina,Oldpeak,ST_Slope,HeartDisease
40,M,ATA,140,289,0,Normal,172,N,0,Up,0
54,M,ASY,0,0,1,Normal,130,Y,1.5,Flat,1
49,F,NAP,160.0,,0,Normal,156,N,1,Flat,
";

    #[test]
    fn test_parses_csv_into_records() {
        let table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns().len(), 12);

        let records = table.records().unwrap();
        assert_eq!(records[0].cholesterol, Some(289));
        assert_eq!(records[0].heart_disease, Some(0));
        // raw zeros are preserved until normalization
        assert_eq!(records[1].resting_bp, Some(0));
        assert_eq!(records[1].oldpeak, 1.5);
        assert_eq!(records[2].resting_bp, Some(160));
        assert_eq!(records[2].cholesterol, None);
        assert_eq!(records[2].heart_disease, None);
    }

    #[test]
    fn test_missing_feature_column_is_shape_error() {
        let mut table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        table.take_column("MaxHR");

        match table.records() {
            Err(Error::DataShape(msg)) => assert!(msg.contains("MaxHR")),
            other => panic!("expected data-shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_take_column_removes_cells() {
        let mut table = Table::from_csv_reader(CSV.as_bytes()).unwrap();
        let labels = table.take_column(LABEL_COLUMN).unwrap();

        assert_eq!(labels, vec![Some("0".to_string()), Some("1".to_string()), None]);
        assert!(!table.has_column(LABEL_COLUMN));
        assert_eq!(table.records().unwrap()[0].heart_disease, None);
    }

    #[test]
    fn test_null_in_required_field_is_constraint_error() {
        let csv = CSV.replace("54,M,ASY", "54,,ASY");
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();

        assert!(matches!(table.records(), Err(Error::Constraint(_))));
    }

    #[test]
    fn test_type_mismatch_is_constraint_error() {
        let csv = CSV.replace("172", "fast");
        let table = Table::from_csv_reader(csv.as_bytes()).unwrap();

        assert!(matches!(table.records(), Err(Error::Constraint(_))));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Table::new(vec!["a".to_string()], vec![vec![None, None]]);
        assert!(matches!(result, Err(Error::DataShape(_))));
    }
}
