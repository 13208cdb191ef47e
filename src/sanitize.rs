//! Transport cleaning for analysis responses.
//!
//! [`Sanitize::clean_invalid_values`] replaces NaN and infinities with `0.0`,
//! [`Sanitize::round_floats`] rounds every float. Both walk nested containers
//! and leave non-float leaves untouched.

use crate::decomposition::{Decomposition, DecompositionOutcome};
use crate::forecast::{Forecast, ForecastOutcome};
use crate::scenario::SimulatedForecast;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

pub trait Sanitize {
    fn clean_invalid_values(&mut self);

    fn round_floats(&mut self, decimals: u32);
}

/// Cleans then rounds.
pub fn sanitize<T: Sanitize>(mut value: T, decimals: u32) -> T {
    value.clean_invalid_values();
    value.round_floats(decimals);
    value
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

impl Sanitize for f64 {
    fn clean_invalid_values(&mut self) {
        if !self.is_finite() {
            *self = 0.0;
        }
    }

    fn round_floats(&mut self, decimals: u32) {
        *self = round_to(*self, decimals);
    }
}

impl Sanitize for f32 {
    fn clean_invalid_values(&mut self) {
        if !self.is_finite() {
            *self = 0.0;
        }
    }

    fn round_floats(&mut self, decimals: u32) {
        *self = round_to(f64::from(*self), decimals) as f32;
    }
}

macro_rules! passthrough {
    ($($ty:ty),*) => {
        $(
            impl Sanitize for $ty {
                fn clean_invalid_values(&mut self) {}

                fn round_floats(&mut self, _decimals: u32) {}
            }
        )*
    };
}

passthrough!(bool, String, i32, i64, u32, u64, usize);

impl<T: Sanitize> Sanitize for Vec<T> {
    fn clean_invalid_values(&mut self) {
        self.iter_mut().for_each(Sanitize::clean_invalid_values);
    }

    fn round_floats(&mut self, decimals: u32) {
        self.iter_mut().for_each(|v| v.round_floats(decimals));
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn clean_invalid_values(&mut self) {
        if let Some(v) = self {
            v.clean_invalid_values();
        }
    }

    fn round_floats(&mut self, decimals: u32) {
        if let Some(v) = self {
            v.round_floats(decimals);
        }
    }
}

impl<T: Sanitize> Sanitize for Box<T> {
    fn clean_invalid_values(&mut self) {
        self.as_mut().clean_invalid_values();
    }

    fn round_floats(&mut self, decimals: u32) {
        self.as_mut().round_floats(decimals);
    }
}

impl<K, T: Sanitize> Sanitize for BTreeMap<K, T> {
    fn clean_invalid_values(&mut self) {
        self.values_mut().for_each(Sanitize::clean_invalid_values);
    }

    fn round_floats(&mut self, decimals: u32) {
        self.values_mut().for_each(|v| v.round_floats(decimals));
    }
}

impl<K, T: Sanitize, S: BuildHasher> Sanitize for HashMap<K, T, S> {
    fn clean_invalid_values(&mut self) {
        self.values_mut().for_each(Sanitize::clean_invalid_values);
    }

    fn round_floats(&mut self, decimals: u32) {
        self.values_mut().for_each(|v| v.round_floats(decimals));
    }
}

/// JSON numbers are always finite, so only rounding applies.
impl Sanitize for Value {
    fn clean_invalid_values(&mut self) {
        match self {
            Value::Array(items) => items.iter_mut().for_each(Sanitize::clean_invalid_values),
            Value::Object(map) => map
                .values_mut()
                .for_each(Sanitize::clean_invalid_values),
            _ => {}
        }
    }

    fn round_floats(&mut self, decimals: u32) {
        match self {
            Value::Number(n) if n.is_f64() => {
                if let Some(rounded) = n
                    .as_f64()
                    .and_then(|f| Number::from_f64(round_to(f, decimals)))
                {
                    *n = rounded;
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|v| v.round_floats(decimals)),
            Value::Object(map) => map.values_mut().for_each(|v| v.round_floats(decimals)),
            _ => {}
        }
    }
}

impl Sanitize for Decomposition {
    fn clean_invalid_values(&mut self) {
        self.trend.clean_invalid_values();
        self.seasonal.clean_invalid_values();
        self.resid.clean_invalid_values();
    }

    fn round_floats(&mut self, decimals: u32) {
        self.trend.round_floats(decimals);
        self.seasonal.round_floats(decimals);
        self.resid.round_floats(decimals);
    }
}

impl Sanitize for DecompositionOutcome {
    fn clean_invalid_values(&mut self) {
        match self {
            Self::Full(d) => d.clean_invalid_values(),
            Self::Fallback { decomposition, .. } => decomposition.clean_invalid_values(),
            Self::Failed { .. } => {}
        }
    }

    fn round_floats(&mut self, decimals: u32) {
        match self {
            Self::Full(d) => d.round_floats(decimals),
            Self::Fallback { decomposition, .. } => decomposition.round_floats(decimals),
            Self::Failed { .. } => {}
        }
    }
}

impl Sanitize for Forecast {
    fn clean_invalid_values(&mut self) {
        self.predicted_revenue.clean_invalid_values();
        self.predicted_profit.clean_invalid_values();
        self.avg_growth.clean_invalid_values();
        self.predicted_revenue_series.clean_invalid_values();
        self.predicted_profit_series.clean_invalid_values();
    }

    fn round_floats(&mut self, decimals: u32) {
        self.predicted_revenue.round_floats(decimals);
        self.predicted_profit.round_floats(decimals);
        self.avg_growth.round_floats(decimals);
        self.predicted_revenue_series.round_floats(decimals);
        self.predicted_profit_series.round_floats(decimals);
    }
}

impl Sanitize for ForecastOutcome {
    fn clean_invalid_values(&mut self) {
        if let Self::Ready(f) = self {
            f.clean_invalid_values();
        }
    }

    fn round_floats(&mut self, decimals: u32) {
        if let Self::Ready(f) = self {
            f.round_floats(decimals);
        }
    }
}

impl Sanitize for SimulatedForecast {
    fn clean_invalid_values(&mut self) {
        self.predicted_revenue.clean_invalid_values();
        self.predicted_profit.clean_invalid_values();
    }

    fn round_floats(&mut self, decimals: u32) {
        self.predicted_revenue.round_floats(decimals);
        self.predicted_profit.round_floats(decimals);
    }
}
