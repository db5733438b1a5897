//! Discrete search spaces.
//!
//! The optimizer only ever sees a [`SearchSpace`] as a list of
//! dimensions with a value count each. What an index *means* is resolved
//! through [`SearchSpace::value`] when a point is reported or handed to an
//! evaluator.

use nt_types::{NtError, NtResult, ParameterValue, Point, SearchSpaceError};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::functions::{self, TestFunction};

/// Common trait for every search space.
pub trait SearchSpace: fmt::Debug + Send + Sync {
    fn n_dims(&self) -> usize;

    /// Number of legal values in `dim`.
    fn n_values(&self, dim: usize) -> usize;

    /// The semantic value of `index` in `dim`.
    fn value(&self, dim: usize, index: usize) -> ParameterValue;

    fn name(&self, dim: usize) -> &str;

    /// Settings that are reported with every point but never searched.
    fn fixed(&self) -> Vec<(String, ParameterValue)> {
        Vec::new()
    }

    fn cardinalities(&self) -> Vec<usize> {
        (0..self.n_dims()).map(|d| self.n_values(d)).collect()
    }

    /// Number of points in the space, `None` if it does not fit in a `u128`.
    fn size(&self) -> Option<u128> {
        (0..self.n_dims()).try_fold(1u128, |acc, d| acc.checked_mul(self.n_values(d) as u128))
    }

    fn validate(&self) -> NtResult<()> {
        if self.n_dims() == 0 {
            return Err(SearchSpaceError::NoDimensions.into());
        }
        let mut seen = HashSet::new();
        for d in 0..self.n_dims() {
            if self.n_values(d) == 0 {
                return Err(SearchSpaceError::EmptyDimension {
                    dim: d,
                    name: self.name(d).to_string(),
                }
                .into());
            }
            if !seen.insert(self.name(d).to_string()) {
                return Err(SearchSpaceError::DuplicateName {
                    name: self.name(d).to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn check_point(&self, point: &Point) -> NtResult<()> {
        point.check_bounds(&self.cardinalities())?;
        Ok(())
    }

    /// Uniformly random point.
    fn random_point(&self, rng: &mut dyn RngCore) -> Point {
        Point::new(
            (0..self.n_dims())
                .map(|d| rng.gen_range(0..self.n_values(d)))
                .collect(),
        )
    }

    /// Per-dimension values of `point`, in dimension order.
    fn values(&self, point: &Point) -> Vec<ParameterValue> {
        point
            .indices()
            .iter()
            .enumerate()
            .map(|(d, &i)| self.value(d, i))
            .collect()
    }

    /// Name → value for every searched dimension plus the fixed settings.
    fn decode(&self, point: &Point) -> Map<String, Value> {
        let mut out = Map::new();
        for (d, &i) in point.indices().iter().enumerate() {
            out.insert(self.name(d).to_string(), self.value(d, i).to_json());
        }
        for (name, value) in self.fixed() {
            out.insert(name, value.to_json());
        }
        out
    }

    /// One line per dimension listing its values, for logs.
    fn describe(&self) -> String {
        (0..self.n_dims())
            .map(|d| {
                let values: Vec<String> = (0..self.n_values(d))
                    .map(|i| self.value(d, i).to_string())
                    .collect();
                format!("{}: [{}]", self.name(d), values.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---- Declarative parameter space ----

/// One searched dimension: a name and its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub values: Vec<ParameterValue>,
}

/// A search space written out value by value, in code or in JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpace {
    dimensions: Vec<Dimension>,
    fixed: Vec<(String, ParameterValue)>,
    class: Option<String>,
}

#[derive(Deserialize)]
struct StructuredDefinition {
    parameters: Vec<StructuredEntry>,
    #[serde(default)]
    class: Option<String>,
}

#[derive(Deserialize)]
struct StructuredEntry {
    name: String,
    #[serde(default)]
    values: Option<Vec<Value>>,
    #[serde(default)]
    value: Option<Value>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_choice<V: Into<ParameterValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.dimensions.push(Dimension {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Integers `low, low + step, ..` up to and including `high`.
    pub fn add_int_range(self, name: impl Into<String>, low: i64, high: i64, step: i64) -> Self {
        let step = step.max(1);
        let values: Vec<ParameterValue> = (low..=high)
            .step_by(step as usize)
            .map(ParameterValue::Int)
            .collect();
        self.add_choice(name, values)
    }

    /// `steps` evenly spaced floats from `low` to `high` inclusive.
    pub fn add_float_steps(self, name: impl Into<String>, low: f64, high: f64, steps: usize) -> Self {
        let values: Vec<ParameterValue> = (0..steps)
            .map(|i| {
                let t = if steps > 1 {
                    i as f64 / (steps - 1) as f64
                } else {
                    0.0
                };
                ParameterValue::Float(low + t * (high - low))
            })
            .collect();
        self.add_choice(name, values)
    }

    /// `steps` floats evenly spaced in log-space. Both bounds must be positive.
    pub fn add_log_steps(self, name: impl Into<String>, low: f64, high: f64, steps: usize) -> Self {
        let (log_low, log_high) = (low.ln(), high.ln());
        let values: Vec<ParameterValue> = (0..steps)
            .map(|i| {
                let t = if steps > 1 {
                    i as f64 / (steps - 1) as f64
                } else {
                    0.0
                };
                ParameterValue::Float((log_low + t * (log_high - log_low)).exp())
            })
            .collect();
        self.add_choice(name, values)
    }

    pub fn add_fixed(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.fixed.push((name.into(), value.into()));
        self
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The `"class"` entry of a flat JSON definition, if any.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Parse either the `{"parameters": [..]}` form or the flat object form.
    pub fn from_value(value: &Value) -> NtResult<Self> {
        let object = value.as_object().ok_or_else(|| invalid("expected a JSON object"))?;

        let space = if object.get("parameters").map_or(false, Value::is_array) {
            Self::from_structured(serde_json::from_value(value.clone())?)?
        } else {
            Self::from_flat(object)?
        };
        space.validate()?;
        Ok(space)
    }

    pub fn from_json(text: &str) -> NtResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn load(path: impl AsRef<Path>) -> NtResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn from_structured(definition: StructuredDefinition) -> NtResult<Self> {
        let mut space = Self {
            class: definition.class,
            ..Self::default()
        };
        for entry in definition.parameters {
            match (entry.values, entry.value) {
                (Some(values), _) => {
                    space = space.add_choice(
                        entry.name,
                        values.iter().map(ParameterValue::from_json).collect::<Vec<_>>(),
                    );
                }
                (None, Some(value)) => {
                    space = space.add_fixed(entry.name, ParameterValue::from_json(&value));
                }
                (None, None) => {
                    return Err(invalid(format!(
                        "parameter {} has neither \"values\" nor \"value\"",
                        entry.name
                    )))
                }
            }
        }
        Ok(space)
    }

    fn from_flat(object: &Map<String, Value>) -> NtResult<Self> {
        let mut space = Self::new();
        for (name, value) in object {
            match value {
                Value::String(class) if name == "class" => space.class = Some(class.clone()),
                Value::Array(values) => {
                    space = space.add_choice(
                        name.clone(),
                        values.iter().map(ParameterValue::from_json).collect::<Vec<_>>(),
                    );
                }
                other => {
                    space = space.add_fixed(name.clone(), ParameterValue::from_json(other));
                }
            }
        }
        Ok(space)
    }
}

fn invalid(message: impl Into<String>) -> NtError {
    SearchSpaceError::InvalidDefinition {
        message: message.into(),
    }
    .into()
}

impl SearchSpace for ParameterSpace {
    fn n_dims(&self) -> usize {
        self.dimensions.len()
    }

    fn n_values(&self, dim: usize) -> usize {
        self.dimensions[dim].values.len()
    }

    fn value(&self, dim: usize, index: usize) -> ParameterValue {
        self.dimensions[dim].values[index].clone()
    }

    fn name(&self, dim: usize) -> &str {
        &self.dimensions[dim].name
    }

    fn fixed(&self) -> Vec<(String, ParameterValue)> {
        self.fixed.clone()
    }
}

// ---- Function test space ----

/// The unit cube discretised evenly, for benchmarking against a
/// [`TestFunction`].
#[derive(Debug, Clone)]
pub struct FunctionSpace {
    function: &'static TestFunction,
    n_values: usize,
    names: Vec<String>,
}

impl FunctionSpace {
    /// `dims` only matters for variadic functions; `discretisation` is the
    /// number of values per dimension.
    pub fn new(function: &str, dims: Option<usize>, discretisation: usize) -> NtResult<Self> {
        let function = functions::lookup(function)?;
        let dims = function.resolve_dims(dims)?;
        let space = Self {
            function,
            n_values: discretisation,
            names: (0..dims).map(|d| format!("x{d}")).collect(),
        };
        space.validate()?;
        Ok(space)
    }

    pub fn function(&self) -> &'static TestFunction {
        self.function
    }

    pub fn coordinate(&self, index: usize) -> f64 {
        if self.n_values > 1 {
            index as f64 / (self.n_values - 1) as f64
        } else {
            0.0
        }
    }

    /// Unit-cube coordinates of `point`.
    pub fn coordinates(&self, point: &Point) -> Vec<f64> {
        point.indices().iter().map(|&i| self.coordinate(i)).collect()
    }
}

impl SearchSpace for FunctionSpace {
    fn n_dims(&self) -> usize {
        self.names.len()
    }

    fn n_values(&self, _dim: usize) -> usize {
        self.n_values
    }

    fn value(&self, _dim: usize, index: usize) -> ParameterValue {
        ParameterValue::Float(self.coordinate(index))
    }

    fn name(&self, dim: usize) -> &str {
        &self.names[dim]
    }
}
