//! Shared utilities for the exploration views.
//!
//! This module contains column access, dtype classification, mask helpers
//! and name cleaning used across the cache, box and scatter modules.

use crate::error::{ExploreError, Result, ResultExt};
use crate::types::{Category, Mask};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for charting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Boolean type
    Boolean,
    /// String/categorical type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// Column Access
// =============================================================================

/// Look up a column as a materialized series.
pub fn column_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| ExploreError::ColumnNotFound(name.to_string()))
}

/// Finite, non-null values of a series as `f64`.
pub fn finite_values(series: &Series) -> Result<Vec<f64>> {
    let float_series = series
        .cast(&DataType::Float64)
        .context(format!("column '{}' is not numeric", series.name()))?;
    Ok(float_series
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect())
}

/// Values of a series as `f64`, keeping row alignment (nulls become `None`).
pub fn aligned_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let float_series = series
        .cast(&DataType::Float64)
        .context(format!("column '{}' is not numeric", series.name()))?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Values of a series mapped onto [`Category`], keeping row alignment.
pub fn category_values(series: &Series) -> Result<Vec<Option<Category>>> {
    let dtype = series.dtype();
    if matches!(dtype, DataType::Boolean) {
        return Ok(series
            .bool()?
            .into_iter()
            .map(|v| v.map(Category::Bool))
            .collect());
    }
    if is_integer_dtype(dtype) {
        let ints = series.cast(&DataType::Int64)?;
        return Ok(ints
            .i64()?
            .into_iter()
            .map(|v| v.map(Category::Int))
            .collect());
    }
    let strings = series.cast(&DataType::String)?;
    Ok(strings
        .str()?
        .into_iter()
        .map(|v| v.map(Category::from))
        .collect())
}

// =============================================================================
// Mask Utilities
// =============================================================================

/// Fail unless `mask` has exactly `rows` entries.
pub fn check_mask(mask: &Mask, rows: usize) -> Result<()> {
    if mask.len() != rows {
        return Err(ExploreError::mask_length(rows, mask.len()));
    }
    Ok(())
}

/// Number of rows set to `true` (nulls count as unselected).
pub fn count_selected(mask: &Mask) -> usize {
    mask.into_iter().filter(|v| *v == Some(true)).count()
}

/// Mask as a plain vector, with nulls treated as unselected.
pub fn mask_to_vec(mask: &Mask) -> Vec<bool> {
    mask.into_iter().map(|v| v.unwrap_or(false)).collect()
}

/// Pick the values at rows where `keep` is true.
pub fn select_rows<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
    values
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k)
        .map(|(v, _)| v.clone())
        .collect()
}

// =============================================================================
// Name Utilities
// =============================================================================

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").expect("static regex"));

/// Turn a column name into an identifier usable in a row expression.
///
/// Every non-word character becomes `_`, and a leading digit gets a `_`
/// prefix, so `"Fuel Price ($)"` becomes `Fuel_Price____`.
pub fn clean_name(name: &str) -> String {
    let cleaned = NON_WORD.replace_all(name, "_").into_owned();
    if cleaned.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{cleaned}")
    } else {
        cleaned
    }
}
