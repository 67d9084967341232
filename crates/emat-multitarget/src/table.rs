//! Numeric tables with optional row and column labels.
//!
//! Regressors take and return [`Table`]s. Labels travel with the values so
//! predictions can be indexed like the caller's inputs.

use crate::error::{RegressionError, Result};
use nalgebra::DMatrix;
use polars::prelude::*;

/// A dense `f64` matrix with optional labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub values: DMatrix<f64>,
    pub row_labels: Option<Vec<String>>,
    pub column_names: Option<Vec<String>>,
}

impl From<DMatrix<f64>> for Table {
    fn from(values: DMatrix<f64>) -> Self {
        Self::new(values)
    }
}

impl Table {
    /// Unlabelled table.
    pub fn new(values: DMatrix<f64>) -> Self {
        Self {
            values,
            row_labels: None,
            column_names: None,
        }
    }

    /// Table from row-major values.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != ncols) {
            return Err(RegressionError::shape("columns", ncols, bad.len()));
        }
        Ok(Self::new(DMatrix::from_fn(rows.len(), ncols, |i, j| {
            rows[i][j]
        })))
    }

    pub fn with_row_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.nrows() {
            return Err(RegressionError::shape("row labels", self.nrows(), labels.len()));
        }
        self.row_labels = Some(labels);
        Ok(self)
    }

    pub fn with_column_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.ncols() {
            return Err(RegressionError::shape("column names", self.ncols(), names.len()));
        }
        self.column_names = Some(names);
        Ok(self)
    }

    /// Numeric columns of `df`, labelled with their names.
    ///
    /// Nulls are rejected; every column is cast to `f64`.
    pub fn from_dataframe(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let mut values = DMatrix::zeros(df.height(), columns.len());
        for (j, name) in columns.iter().enumerate() {
            let series = df
                .column(name)?
                .as_materialized_series()
                .cast(&DataType::Float64)?;
            for (i, v) in series.f64()?.into_iter().enumerate() {
                values[(i, j)] = v.ok_or_else(|| {
                    RegressionError::InvalidData(format!("column '{name}' has a null at row {i}"))
                })?;
            }
        }
        Ok(Self {
            values,
            row_labels: None,
            column_names: Some(columns.iter().map(|c| c.to_string()).collect()),
        })
    }

    /// Like [`from_dataframe`](Self::from_dataframe), with row labels taken
    /// from the string form of `index`.
    pub fn from_dataframe_indexed(df: &DataFrame, index: &str, columns: &[&str]) -> Result<Self> {
        let labels = df
            .column(index)?
            .as_materialized_series()
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();
        Self::from_dataframe(df, columns)?.with_row_labels(labels)
    }

    /// Back to a DataFrame. Unnamed columns are numbered from `0`; row labels
    /// become a leading `index` column.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.ncols() + 1);
        if let Some(labels) = &self.row_labels {
            columns.push(Column::new("index".into(), labels.clone()));
        }
        for j in 0..self.ncols() {
            let name = match &self.column_names {
                Some(names) => names[j].clone(),
                None => j.to_string(),
            };
            let values: Vec<f64> = self.values.column(j).iter().copied().collect();
            columns.push(Column::new(name.into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_labeled(&self) -> bool {
        self.row_labels.is_some() || self.column_names.is_some()
    }

    /// Rows `rows` of the table, keeping their labels.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            values: self.values.select_rows(rows),
            row_labels: self
                .row_labels
                .as_ref()
                .map(|labels| rows.iter().map(|&i| labels[i].clone()).collect()),
            column_names: self.column_names.clone(),
        }
    }

    pub(crate) fn ensure_finite(&self, what: &str) -> Result<()> {
        match self.values.iter().position(|v| !v.is_finite()) {
            Some(pos) => Err(RegressionError::InvalidData(format!(
                "{what} has a non-finite value at row {}",
                pos % self.nrows().max(1)
            ))),
            None => Ok(()),
        }
    }
}
