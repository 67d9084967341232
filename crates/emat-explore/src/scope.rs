//! Scope: the declared variables of an exploratory model.
//!
//! A scope names every lever, uncertainty and measure, with its semantic
//! type, domain bounds and category labels. The views only ever read it.

use crate::error::{ExploreError, Result};
use crate::types::Category;
use crate::utils::{DtypeCategory, get_dtype_category, is_integer_dtype};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Semantic type of a variable; drives chart and selector construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Boolean,
    Categorical,
    Integer,
    #[default]
    Continuous,
}

impl VariableType {
    /// Whether values are summarized by frequency bars rather than bins.
    pub fn is_discrete_choice(&self) -> bool {
        matches!(self, VariableType::Boolean | VariableType::Categorical)
    }
}

/// Where a parameter sits in the exploratory model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterRole {
    /// A policy lever under the decision maker's control.
    Lever,
    /// An exogenous uncertainty.
    Uncertainty,
    /// A fixed value.
    Constant,
}

/// An input parameter of the scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub role: ParameterRole,
    #[serde(default)]
    pub dtype: VariableType,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub shortname: Option<String>,
}

/// A performance measure; measures carry no declared domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    #[serde(default)]
    pub dtype: VariableType,
    #[serde(default)]
    pub shortname: Option<String>,
}

/// Declared variables of a model, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a scope from its JSON description.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// A scope declaring every column of `data` as a measure, typed from
    /// its dtype. Columns of other dtypes are left out.
    pub fn from_data(name: impl Into<String>, data: &DataFrame) -> Self {
        let mut scope = Self::new(name);
        for column in data.get_columns() {
            let dtype = column.dtype();
            let declared = match get_dtype_category(dtype) {
                DtypeCategory::Boolean => VariableType::Boolean,
                DtypeCategory::String => VariableType::Categorical,
                DtypeCategory::Numeric if is_integer_dtype(dtype) => VariableType::Integer,
                DtypeCategory::Numeric => VariableType::Continuous,
                DtypeCategory::Other => {
                    debug!("leaving '{}' ({}) out of the scope", column.name(), dtype);
                    continue;
                }
            };
            scope.measures.push(Measure {
                name: column.name().to_string(),
                dtype: declared,
                shortname: None,
            });
        }
        scope
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measures.push(measure);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameter(name).is_some() || self.measure(name).is_some()
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name == name)
    }

    /// Declared type of a variable.
    pub fn get_dtype(&self, name: &str) -> Result<VariableType> {
        if let Some(p) = self.parameter(name) {
            return Ok(p.dtype);
        }
        self.measure(name)
            .map(|m| m.dtype)
            .ok_or_else(|| ExploreError::NotInScope(name.to_string()))
    }

    /// Category labels of a categorical parameter (empty for others).
    pub fn get_cat_values(&self, name: &str) -> Result<Vec<Category>> {
        match self.parameter(name) {
            Some(p) => Ok(p.categories.clone()),
            None if self.measure(name).is_some() => Ok(Vec::new()),
            None => Err(ExploreError::NotInScope(name.to_string())),
        }
    }

    /// Declared `(min, max)` of a parameter.
    pub fn bounds(&self, name: &str) -> (Option<f64>, Option<f64>) {
        self.parameter(name)
            .map(|p| (p.min, p.max))
            .unwrap_or((None, None))
    }

    pub fn get_lever_names(&self) -> Vec<String> {
        self.names_with_role(ParameterRole::Lever)
    }

    pub fn get_uncertainty_names(&self) -> Vec<String> {
        self.names_with_role(ParameterRole::Uncertainty)
    }

    pub fn get_constant_names(&self) -> Vec<String> {
        self.names_with_role(ParameterRole::Constant)
    }

    pub fn get_measure_names(&self) -> Vec<String> {
        self.measures.iter().map(|m| m.name.clone()).collect()
    }

    pub fn is_measure(&self, name: &str) -> bool {
        self.measure(name).is_some()
    }

    /// Short display name, falling back to the full name.
    pub fn shortname<'a>(&'a self, name: &'a str) -> &'a str {
        let short = match self.parameter(name) {
            Some(p) => p.shortname.as_deref(),
            None => self.measure(name).and_then(|m| m.shortname.as_deref()),
        };
        short.unwrap_or(name)
    }

    fn names_with_role(&self, role: ParameterRole) -> Vec<String> {
        self.parameters
            .iter()
            .filter(|p| p.role == role)
            .map(|p| p.name.clone())
            .collect()
    }
}

impl Parameter {
    /// Continuous parameter over `[min, max]`.
    pub fn continuous(name: impl Into<String>, role: ParameterRole, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            role,
            dtype: VariableType::Continuous,
            min: Some(min),
            max: Some(max),
            categories: Vec::new(),
            shortname: None,
        }
    }

    /// Integer parameter over `[min, max]`.
    pub fn integer(name: impl Into<String>, role: ParameterRole, min: i64, max: i64) -> Self {
        Self {
            dtype: VariableType::Integer,
            ..Self::continuous(name, role, min as f64, max as f64)
        }
    }

    /// Categorical parameter with ordered labels.
    pub fn categorical(
        name: impl Into<String>,
        role: ParameterRole,
        categories: Vec<Category>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            dtype: VariableType::Categorical,
            min: None,
            max: None,
            categories,
            shortname: None,
        }
    }

    pub fn boolean(name: impl Into<String>, role: ParameterRole) -> Self {
        Self {
            dtype: VariableType::Boolean,
            ..Self::categorical(name, role, vec![Category::Bool(false), Category::Bool(true)])
        }
    }

    pub fn with_shortname(mut self, shortname: impl Into<String>) -> Self {
        self.shortname = Some(shortname.into());
        self
    }
}

impl Measure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: VariableType::Continuous,
            shortname: None,
        }
    }

    pub fn with_shortname(mut self, shortname: impl Into<String>) -> Self {
        self.shortname = Some(shortname.into());
        self
    }
}
