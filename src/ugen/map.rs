//! Map: re-range a value from one interval to another
//!
//! The Linear curve does not clamp a negative percentage while the
//! exponential curve does (a negative base would give NaN). Out-of-range
//! results wrap using the modulo of the opposite bound.

use super::node::{NodeCore, RenderForm, UnitGenerator};
use super::value::{Properties, Value};
use crate::error::{Result, UgenError};
use crate::impl_ugen_common;

/// Property keys in rendering order
const KEYS: [&str; 7] = [
    "input",
    "outputMin",
    "outputMax",
    "inputMin",
    "inputMax",
    "curve",
    "wrap",
];

/// Response curve of a [`Map`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Curve {
    #[default]
    Linear = 0,
    Exponential = 1,
}

impl Curve {
    /// Any non-zero value selects the exponential curve
    pub fn from_f64(v: f64) -> Self {
        if v == 0.0 {
            Curve::Linear
        } else {
            Curve::Exponential
        }
    }

    pub fn as_f64(self) -> f64 {
        self as i32 as f64
    }
}

/// Output and input intervals of a [`Map`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRange {
    pub output_min: f64,
    pub output_max: f64,
    pub input_min: f64,
    pub input_max: f64,
    pub curve: Curve,
    pub wrap: bool,
}

impl MapRange {
    /// Linear, non-wrapping range
    pub fn new(output_min: f64, output_max: f64, input_min: f64, input_max: f64) -> Self {
        Self {
            output_min,
            output_max,
            input_min,
            input_max,
            curve: Curve::Linear,
            wrap: false,
        }
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Map `v` from the input interval to the output interval
    pub fn apply(&self, v: f64) -> f64 {
        let range1 = self.output_max - self.output_min;
        let range2 = self.input_max - self.input_min;
        let mut percent = (v - self.input_min) / range2;

        if percent < 0.0 && self.curve != Curve::Linear {
            percent = 0.0;
        }

        let mut val = match self.curve {
            Curve::Linear => self.output_min + percent * range1,
            Curve::Exponential => self.output_min + percent.powf(1.5) * range1,
        };

        if val > self.output_max {
            val = if self.wrap {
                self.output_min + val % self.output_max
            } else {
                self.output_max
            };
        }
        if val < self.output_min {
            val = if self.wrap {
                self.output_max + val % self.output_min
            } else {
                self.output_min
            };
        }

        val
    }
}

/// Re-ranging node
///
/// Every parameter is a property, so any of them may be driven by another
/// node.
#[derive(Debug)]
pub struct Map {
    core: NodeCore,
    value: f64,
}

impl Map {
    pub fn new(input: impl Into<Value>, range: MapRange) -> Self {
        let properties = Properties::new()
            .with(KEYS[0], input)
            .with(KEYS[1], range.output_min)
            .with(KEYS[2], range.output_max)
            .with(KEYS[3], range.input_min)
            .with(KEYS[4], range.input_max)
            .with(KEYS[5], range.curve.as_f64())
            .with(KEYS[6], range.wrap);

        Self {
            core: NodeCore::new("map", properties),
            value: 0.0,
        }
    }

    /// Build from named properties in any order
    ///
    /// `curve` defaults to Linear and `wrap` to false; the other keys are
    /// required.
    pub fn from_properties(properties: &Properties) -> Result<Self> {
        let mut ordered = Properties::new();
        for key in KEYS {
            let value = match (properties.get_named(key), key) {
                (Some(value), _) if !value.is_unset() => value.clone(),
                (_, "curve") => Value::Scalar(Curve::Linear.as_f64()),
                (_, "wrap") => Value::Bool(false),
                _ => {
                    return Err(UgenError::InvalidArgument {
                        method: "map".to_string(),
                        reason: format!("missing property '{}'", key),
                    })
                }
            };
            ordered.set(key, value);
        }

        Ok(Self {
            core: NodeCore::new("map", ordered),
            value: 0.0,
        })
    }

    /// Last computed output
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl UnitGenerator for Map {
    impl_ugen_common!();

    fn form(&self) -> RenderForm {
        RenderForm::Call("map")
    }

    fn process(&mut self, inputs: &[f64]) -> f64 {
        let [v, output_min, output_max, input_min, input_max, curve, wrap, ..] = inputs else {
            return self.value;
        };

        let range = MapRange::new(*output_min, *output_max, *input_min, *input_max)
            .with_curve(Curve::from_f64(*curve))
            .with_wrap(*wrap != 0.0);

        self.value = range.apply(*v);
        self.value
    }

    fn invoke(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        match method {
            "getValue" => Ok(Value::Scalar(self.value)),
            _ => self.core.invoke_common(method, args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_to_ten() -> MapRange {
        MapRange::new(0.0, 10.0, 0.0, 1.0)
    }

    #[test]
    fn test_linear_in_range() {
        assert_relative_eq!(unit_to_ten().apply(0.25), 2.5);
        assert_eq!(unit_to_ten().apply(0.0), 0.0);
    }

    #[test]
    fn test_linear_clamps_without_wrap() {
        let range = MapRange::new(2.0, 10.0, 0.0, 1.0);
        assert_eq!(range.apply(-5.0), 2.0);
        assert_eq!(range.apply(3.0), 10.0);
    }

    #[test]
    fn test_wrap_above_uses_output_max_modulo() {
        // 15 > 10 -> 0 + 15 % 10
        let range = unit_to_ten().with_wrap(true);
        assert_relative_eq!(range.apply(1.5), 5.0);
    }

    #[test]
    fn test_wrap_below_uses_output_min_modulo() {
        // val = 4 + (-1 * 6) = -2 < 4 -> 10 + (-2 % 4)
        let range = MapRange::new(4.0, 10.0, 0.0, 1.0).with_wrap(true);
        assert_relative_eq!(range.apply(-1.0), 8.0);
    }

    #[test]
    fn test_exponential_clamps_negative_percent() {
        let range = unit_to_ten().with_curve(Curve::Exponential);
        assert_eq!(range.apply(-0.5), 0.0);
        assert_relative_eq!(range.apply(0.25), 10.0 * 0.125);
    }

    #[test]
    fn test_linear_does_not_clamp_negative_percent() {
        // Negative percent survives into val; only the final bound check
        // (with wrap) shows it.
        let range = MapRange::new(4.0, 10.0, 0.0, 1.0).with_wrap(true);
        let exp = range.with_curve(Curve::Exponential);
        assert_relative_eq!(range.apply(-1.0), 8.0);
        assert_eq!(exp.apply(-1.0), 4.0);
    }

    #[test]
    fn test_node_process_and_get_value() {
        let mut map = Map::new(0.5, unit_to_ten());
        let out = map.process(&[0.5, 0.0, 10.0, 0.0, 1.0, 0.0, 0.0]);
        assert_relative_eq!(out, 5.0);
        assert_eq!(map.invoke("getValue", &[]).unwrap(), Value::Scalar(5.0));
    }

    #[test]
    fn test_property_order() {
        let map = Map::new(0.0, unit_to_ten());
        let keys: Vec<String> = map.properties().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, KEYS.to_vec());
    }

    #[test]
    fn test_from_properties_defaults() {
        let props = Properties::new()
            .with("inputMax", 1.0)
            .with("input", 0.2)
            .with("outputMin", 0.0)
            .with("outputMax", 1.0)
            .with("inputMin", 0.0);
        let map = Map::from_properties(&props).unwrap();
        assert_eq!(map.properties().get_named("wrap"), Some(&Value::Bool(false)));
        assert_eq!(
            map.properties().iter().next().map(|(k, _)| k.to_string()),
            Some("input".to_string())
        );

        let missing = Properties::new().with("input", 0.2);
        assert!(Map::from_properties(&missing).is_err());
    }
}
