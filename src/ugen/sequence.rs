//! Step sequencer
//!
//! A sequence emits an evolving stream of values rather than a pure function
//! of its inputs, so it is a sequence producer: mirrored snapshots carry its
//! full state instead of a reference.

use super::node::{NodeCore, RenderForm, UnitGenerator};
use super::value::{Properties, PropertyKey, Value};
use crate::error::{Result, UgenError};
use crate::impl_ugen_common;

/// Steps through its positional values, advancing every `rate` samples
#[derive(Debug)]
pub struct Sequence {
    core: NodeCore,
    phase: f64,
    index: usize,
    running: bool,
    value: f64,
}

impl Sequence {
    /// Build a running sequence over `values`
    pub fn new<I>(values: I, rate: impl Into<Value>) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut properties = Properties::new().with("rate", rate);
        for (i, value) in values.into_iter().enumerate() {
            properties.set(i, value);
        }
        Self::with_properties(properties)
    }

    /// Build from a property bag holding `rate` and positional steps
    pub fn from_properties(properties: &Properties) -> Result<Self> {
        let rate = properties.get_named("rate").cloned().unwrap_or(Value::Scalar(1.0));
        let mut ordered = Properties::new().with("rate", rate);
        for (key, value) in properties.iter() {
            if let PropertyKey::Index(i) = key {
                ordered.set(*i, value.clone());
            }
        }
        Self::with_properties(ordered)
    }

    fn with_properties(properties: Properties) -> Result<Self> {
        if properties.len() < 2 {
            return Err(UgenError::InvalidArgument {
                method: "sequence".to_string(),
                reason: "a sequence needs at least one step".to_string(),
            });
        }

        Ok(Self {
            core: NodeCore::new("sequence", properties),
            phase: 0.0,
            index: 0,
            running: true,
            value: 0.0,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Index of the current step
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl UnitGenerator for Sequence {
    impl_ugen_common!();

    fn form(&self) -> RenderForm {
        RenderForm::Call("sequence")
    }

    fn process(&mut self, inputs: &[f64]) -> f64 {
        let Some((rate, steps)) = inputs.split_first() else {
            return self.value;
        };
        if steps.is_empty() {
            return self.value;
        }

        self.value = steps[self.index % steps.len()];

        if self.running {
            self.phase += 1.0;
            if self.phase >= *rate {
                self.phase = 0.0;
                self.index = (self.index + 1) % steps.len();
            }
        }

        self.value
    }

    fn invoke(&mut self, method: &str, args: &[Value]) -> Result<Value> {
        match method {
            "start" => {
                self.running = true;
                Ok(Value::Unset)
            }
            "stop" => {
                self.running = false;
                Ok(Value::Unset)
            }
            "reset" => {
                self.phase = 0.0;
                self.index = 0;
                Ok(Value::Unset)
            }
            "getValue" => Ok(Value::Scalar(self.value)),
            _ => self.core.invoke_common(method, args),
        }
    }

    fn is_sequence_producer(&self) -> bool {
        true
    }
}
