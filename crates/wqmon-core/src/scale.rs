use polars::prelude::*;
use wqmon_parser::Parameter;

use crate::error::Result;

/// Number of gridline intervals aimed for on the y-axis.
const TARGET_INTERVALS: f64 = 5.0;

/// Rounds `x` to 1, 2, 5 or 10 times its power of ten.
///
/// Non-positive or non-finite input yields 1.
pub fn nice_num(x: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 {
        return 1.0;
    }
    let exponent = x.log10().floor() as i32;
    let magnitude = 10f64.powi(exponent);
    let fraction = x / magnitude;
    let nice_fraction = if fraction < 1.5 {
        1.0
    } else if fraction < 3.0 {
        2.0
    } else if fraction < 7.0 {
        5.0
    } else {
        10.0
    };
    nice_fraction * magnitude
}

/// Y-axis layout derived from a (shared) maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    pub max: f64,
    pub tick: f64,
    pub limit: f64,
}

impl AxisScale {
    /// A non-finite or non-positive `max` falls back to 1.
    pub fn from_max(max: f64) -> Self {
        let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
        let tick = nice_num(max / TARGET_INTERVALS);
        let limit = (max / tick).ceil() * tick;
        Self { max, tick, limit }
    }

    /// Gridline positions from 0 up to and including `limit`.
    pub fn ticks(&self) -> Vec<f64> {
        if !(self.limit.is_finite() && self.tick.is_finite() && self.tick > 0.0) {
            return vec![0.0];
        }
        let steps = (self.limit / self.tick).round() as usize;
        (0..=steps).map(|step| step as f64 * self.tick).collect()
    }
}

/// Per-parameter axis maxima shared by every station chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedMaxima {
    values: [f64; 4],
}

impl SharedMaxima {
    pub fn get(&self, parameter: Parameter) -> f64 {
        self.values[index(parameter)]
    }

    pub fn scale(&self, parameter: Parameter) -> AxisScale {
        AxisScale::from_max(self.get(parameter))
    }
}

/// Largest value of each parameter across the whole merged frame, times `headroom`.
///
/// Non-finite values are ignored. A parameter with no values, or whose maximum is
/// not positive, uses 1 before the headroom is applied.
pub fn shared_axis_maxima(df: &DataFrame, headroom: f64) -> Result<SharedMaxima> {
    let mut values = [0.0; 4];
    for parameter in Parameter::ALL {
        let raw_max = df
            .column(parameter.canonical_name())?
            .f64()?
            .into_iter()
            .flatten()
            .filter(|value| value.is_finite())
            .fold(None, |acc: Option<f64>, value| {
                Some(acc.map_or(value, |current| current.max(value)))
            });
        let raw_max = match raw_max {
            Some(value) if value > 0.0 => value,
            _ => 1.0,
        };
        values[index(parameter)] = raw_max * headroom;
    }
    Ok(SharedMaxima { values })
}

fn index(parameter: Parameter) -> usize {
    match parameter {
        Parameter::SuspendedSolids => 0,
        Parameter::AmmoniaNitrogen => 1,
        Parameter::Bod => 2,
        Parameter::TotalPhosphorus => 3,
    }
}
