//! Registry of synthetic objective functions.
//!
//! Every function takes inputs in `[0, 1]` per dimension, is maximised, and
//! is scaled so that its global optimum scores (approximately) 1.

use nt_types::{NtResult, SearchSpaceError};
use std::f64::consts::PI;

/// A named benchmark objective.
#[derive(Debug)]
pub struct TestFunction {
    pub name: &'static str,
    /// Fixed input dimension, or `None` for functions defined in any dimension.
    pub arity: Option<usize>,
    /// Dimension used for variadic functions when none is requested.
    pub default_dims: usize,
    objective: fn(&[f64]) -> f64,
}

impl TestFunction {
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        (self.objective)(x)
    }

    /// Input dimension for a requested `dims`, checked against the arity.
    pub fn resolve_dims(&self, dims: Option<usize>) -> NtResult<usize> {
        match (self.arity, dims) {
            (Some(arity), Some(d)) if d != arity => Err(SearchSpaceError::InvalidDefinition {
                message: format!("{} takes {} inputs, {} requested", self.name, arity, d),
            }
            .into()),
            (Some(arity), _) => Ok(arity),
            (None, Some(0)) => Err(SearchSpaceError::NoDimensions.into()),
            (None, Some(d)) => Ok(d),
            (None, None) => Ok(self.default_dims),
        }
    }

    /// Best grid cell when every input is discretised into `n_values`
    /// evenly spaced points. Only meant for small grids.
    pub fn grid_optimum(&self, dims: usize, n_values: usize) -> (Vec<usize>, f64) {
        let coord = |i: usize| {
            if n_values > 1 {
                i as f64 / (n_values - 1) as f64
            } else {
                0.0
            }
        };

        let mut cell = vec![0usize; dims];
        let mut best = (cell.clone(), f64::NEG_INFINITY);
        loop {
            let x: Vec<f64> = cell.iter().map(|&i| coord(i)).collect();
            let value = self.evaluate(&x);
            if value > best.1 {
                best = (cell.clone(), value);
            }

            // Odometer increment over the grid.
            let mut d = 0;
            loop {
                if d == dims {
                    return best;
                }
                cell[d] += 1;
                if cell[d] < n_values.max(1) {
                    break;
                }
                cell[d] = 0;
                d += 1;
            }
        }
    }
}

static REGISTRY: &[TestFunction] = &[
    TestFunction {
        name: "branin",
        arity: Some(2),
        default_dims: 2,
        objective: branin,
    },
    TestFunction {
        name: "hartmann3",
        arity: Some(3),
        default_dims: 3,
        objective: hartmann3,
    },
    TestFunction {
        name: "hartmann6",
        arity: Some(6),
        default_dims: 6,
        objective: hartmann6,
    },
    TestFunction {
        name: "sphere",
        arity: None,
        default_dims: 3,
        objective: sphere,
    },
    TestFunction {
        name: "rastrigin",
        arity: None,
        default_dims: 3,
        objective: rastrigin,
    },
    TestFunction {
        name: "parabola",
        arity: Some(1),
        default_dims: 1,
        objective: parabola,
    },
];

/// Look a function up by its name token (case-insensitive).
pub fn lookup(name: &str) -> NtResult<&'static TestFunction> {
    REGISTRY
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| {
            SearchSpaceError::UnknownFunction {
                name: name.to_string(),
            }
            .into()
        })
}

pub fn names() -> Vec<&'static str> {
    REGISTRY.iter().map(|f| f.name).collect()
}

// ---------------------------------------------------------------------------
// Objectives
// ---------------------------------------------------------------------------

const BRANIN_MIN: f64 = 0.397_887_357_729_738;
const BRANIN_MAX: f64 = 308.129_096_012_227;

fn branin(x: &[f64]) -> f64 {
    let x1 = -5.0 + 15.0 * x[0];
    let x2 = 15.0 * x[1];
    let b = 5.1 / (4.0 * PI * PI);
    let c = 5.0 / PI;
    let t = 1.0 / (8.0 * PI);
    let raw = (x2 - b * x1 * x1 + c * x1 - 6.0).powi(2) + 10.0 * (1.0 - t) * x1.cos() + 10.0;
    1.0 - (raw - BRANIN_MIN) / (BRANIN_MAX - BRANIN_MIN)
}

const HARTMANN_ALPHA: [f64; 4] = [1.0, 1.2, 3.0, 3.2];

fn hartmann_sum<const N: usize>(x: &[f64], a: &[[f64; N]; 4], p: &[[f64; N]; 4]) -> f64 {
    (0..4)
        .map(|i| {
            let inner: f64 = (0..N).map(|j| a[i][j] * (x[j] - p[i][j]).powi(2)).sum();
            HARTMANN_ALPHA[i] * (-inner).exp()
        })
        .sum()
}

fn hartmann3(x: &[f64]) -> f64 {
    const A: [[f64; 3]; 4] = [
        [3.0, 10.0, 30.0],
        [0.1, 10.0, 35.0],
        [3.0, 10.0, 30.0],
        [0.1, 10.0, 35.0],
    ];
    const P: [[f64; 3]; 4] = [
        [0.3689, 0.1170, 0.2673],
        [0.4699, 0.4387, 0.7470],
        [0.1091, 0.8732, 0.5547],
        [0.0381, 0.5743, 0.8828],
    ];
    hartmann_sum(x, &A, &P) / 3.862_78
}

fn hartmann6(x: &[f64]) -> f64 {
    const A: [[f64; 6]; 4] = [
        [10.0, 3.0, 17.0, 3.5, 1.7, 8.0],
        [0.05, 10.0, 17.0, 0.1, 8.0, 14.0],
        [3.0, 3.5, 1.7, 10.0, 17.0, 8.0],
        [17.0, 8.0, 0.05, 10.0, 0.1, 14.0],
    ];
    const P: [[f64; 6]; 4] = [
        [0.1312, 0.1696, 0.5569, 0.0124, 0.8283, 0.5886],
        [0.2329, 0.4135, 0.8307, 0.3736, 0.1004, 0.9991],
        [0.2348, 0.1451, 0.3522, 0.2883, 0.3047, 0.6650],
        [0.4047, 0.8828, 0.8732, 0.5743, 0.1091, 0.0381],
    ];
    hartmann_sum(x, &A, &P) / 3.322_37
}

/// Peak at the centre of the cube.
fn sphere(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 1.0;
    }
    let sq: f64 = x.iter().map(|v| (v - 0.5).powi(2)).sum();
    1.0 - sq / (0.25 * x.len() as f64)
}

/// Inputs mapped onto `[-5.12, 5.12]`.
fn rastrigin(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 1.0;
    }
    let raw: f64 = x
        .iter()
        .map(|v| {
            let z = -5.12 + 10.24 * v;
            z * z - 10.0 * (2.0 * PI * z).cos() + 10.0
        })
        .sum();
    1.0 - raw / (40.353_29 * x.len() as f64)
}

fn parabola(x: &[f64]) -> f64 {
    1.0 - (x[0] - 0.7).powi(2)
}
