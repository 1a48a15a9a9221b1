//! Column preprocessing: imputation and one-hot encoding
//!
//! Fitted statistics travel inside the artifact so inference never
//! re-derives them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::features::{FeatureRow, CATEGORICAL_FEATURES, NUMERIC_FEATURES};
use crate::{Error, Result};

/// Fills a missing numeric value with the training median.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianImputer {
    pub column: String,
    pub median: f64,
}

impl MedianImputer {
    pub fn fit(column: &str, values: impl Iterator<Item = Option<f64>>) -> Result<Self> {
        let mut observed: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
        if observed.is_empty() {
            return Err(Error::DataShape(format!("column {} has no observed values", column)));
        }
        observed.sort_by(|a, b| a.total_cmp(b));

        let mid = observed.len() / 2;
        let median = if observed.len() % 2 == 0 {
            (observed[mid - 1] + observed[mid]) / 2.0
        } else {
            observed[mid]
        };

        Ok(Self { column: column.to_string(), median })
    }

    pub fn transform(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) if v.is_finite() => v,
            _ => self.median,
        }
    }
}

/// Fills a missing category with the most frequent training value.
/// Ties go to the lexicographically smallest category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MostFrequentImputer {
    pub column: String,
    pub most_frequent: String,
}

impl MostFrequentImputer {
    pub fn fit<'a>(column: &str, values: impl Iterator<Item = Option<&'a str>>) -> Result<Self> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for value in values.flatten() {
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut best: Option<(&str, usize)> = None;
        for (value, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((value, count));
            }
        }

        let (most_frequent, _) = best.ok_or_else(|| {
            Error::DataShape(format!("column {} has no observed values", column))
        })?;

        Ok(Self {
            column: column.to_string(),
            most_frequent: most_frequent.to_string(),
        })
    }

    pub fn transform<'a>(&'a self, value: Option<&'a str>) -> &'a str {
        value.unwrap_or(&self.most_frequent)
    }
}

/// Indicator columns over a sorted vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub column: String,
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(column: &str, values: impl Iterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = values.map(String::from).collect();
        categories.sort();
        categories.dedup();
        Self { column: column.to_string(), categories }
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Append the indicator columns for `value`. Unknown categories emit all zeros.
    pub fn encode_into(&self, value: &str, out: &mut Vec<f64>) {
        let hit = self.categories.binary_search_by(|c| c.as_str().cmp(value)).ok();
        out.extend((0..self.categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub imputer: MostFrequentImputer,
    pub encoder: OneHotEncoder,
}

/// Column transformer: numeric imputers, then categorical impute + one-hot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric: Vec<MedianImputer>,
    pub categorical: Vec<CategoricalEncoder>,
}

impl Preprocessor {
    pub fn fit(rows: &[FeatureRow]) -> Result<Self> {
        let numeric = NUMERIC_FEATURES
            .iter()
            .enumerate()
            .map(|(i, name)| MedianImputer::fit(name, rows.iter().map(|r| r.numeric[i])))
            .collect::<Result<Vec<_>>>()?;

        let mut categorical = Vec::with_capacity(CATEGORICAL_FEATURES.len());
        for (i, name) in CATEGORICAL_FEATURES.iter().enumerate() {
            let imputer =
                MostFrequentImputer::fit(name, rows.iter().map(|r| r.categorical[i].as_deref()))?;
            let encoder = OneHotEncoder::fit(
                name,
                rows.iter().map(|r| imputer.transform(r.categorical[i].as_deref())),
            );
            categorical.push(CategoricalEncoder { imputer, encoder });
        }

        Ok(Self { numeric, categorical })
    }

    pub fn output_width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.encoder.width()).sum::<usize>()
    }

    /// Names of the output columns, e.g. `Age`, `Sex=M`.
    pub fn output_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|n| n.column.clone()).collect();
        for c in &self.categorical {
            names.extend(
                c.encoder
                    .categories
                    .iter()
                    .map(|cat| format!("{}={}", c.encoder.column, cat)),
            );
        }
        names
    }

    pub fn transform(&self, row: &FeatureRow) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.output_width());
        for (imputer, value) in self.numeric.iter().zip(row.numeric.iter()) {
            out.push(imputer.transform(*value));
        }
        for (c, value) in self.categorical.iter().zip(row.categorical.iter()) {
            let value = c.imputer.transform(value.as_deref());
            c.encoder.encode_into(value, &mut out);
        }
        out
    }
}
