//! Fixed-arity function nodes: `abs`, `sqrt`, `pow` and `merge`

use super::node::{NodeCore, RenderForm, UnitGenerator};
use super::value::{Properties, Value};
use crate::error::{Result, UgenError};
use crate::impl_ugen_common;

/// One-argument numeric function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryKind {
    Abs,
    Sqrt,
}

impl UnaryKind {
    pub fn name(self) -> &'static str {
        match self {
            UnaryKind::Abs => "abs",
            UnaryKind::Sqrt => "sqrt",
        }
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            UnaryKind::Abs => v.abs(),
            UnaryKind::Sqrt => v.sqrt(),
        }
    }
}

/// Collect exactly `N` arguments or fail with an arity error
fn fixed_args<const N: usize, I>(function: &'static str, args: I) -> Result<Properties>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let values: Vec<Value> = args.into_iter().map(Into::into).collect();
    if values.len() != N {
        return Err(UgenError::Arity {
            function,
            expected: N,
            actual: values.len(),
        });
    }
    Ok(Properties::positional(values))
}

/// `abs(x)` or `sqrt(x)`
#[derive(Debug)]
pub struct UnaryFunction {
    core: NodeCore,
    kind: UnaryKind,
}

impl UnaryFunction {
    pub fn new(kind: UnaryKind, arg: impl Into<Value>) -> Self {
        Self {
            core: NodeCore::new(kind.name(), Properties::positional([arg.into()])),
            kind,
        }
    }

    /// Build from a list of arguments, checking arity
    pub fn from_args<I>(kind: UnaryKind, args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let properties = fixed_args::<1, _>(kind.name(), args)?;
        Ok(Self {
            core: NodeCore::new(kind.name(), properties),
            kind,
        })
    }

    pub fn kind(&self) -> UnaryKind {
        self.kind
    }
}

impl UnitGenerator for UnaryFunction {
    impl_ugen_common!();

    fn form(&self) -> RenderForm {
        RenderForm::Call(self.kind.name())
    }

    fn process(&mut self, inputs: &[f64]) -> f64 {
        inputs.first().map_or(0.0, |v| self.kind.apply(*v))
    }
}

/// `base ^ exponent`
#[derive(Debug)]
pub struct Pow {
    core: NodeCore,
}

impl Pow {
    pub fn new(base: impl Into<Value>, exponent: impl Into<Value>) -> Self {
        Self {
            core: NodeCore::new("pow", Properties::positional([base.into(), exponent.into()])),
        }
    }

    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Ok(Self {
            core: NodeCore::new("pow", fixed_args::<2, _>("pow", args)?),
        })
    }
}

impl UnitGenerator for Pow {
    impl_ugen_common!();

    fn form(&self) -> RenderForm {
        RenderForm::Call("pow")
    }

    fn process(&mut self, inputs: &[f64]) -> f64 {
        match inputs {
            [base, exponent, ..] => base.powf(*exponent),
            _ => 0.0,
        }
    }
}

/// Sum of exactly two inputs
///
/// Unlike `add` this is a fixed binary reducer, not a variadic expression.
#[derive(Debug)]
pub struct Merge {
    core: NodeCore,
}

impl Merge {
    pub fn new(a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Self {
            core: NodeCore::new("merge", Properties::positional([a.into(), b.into()])),
        }
    }

    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Ok(Self {
            core: NodeCore::new("merge", fixed_args::<2, _>("merge", args)?),
        })
    }
}

impl UnitGenerator for Merge {
    impl_ugen_common!();

    fn form(&self) -> RenderForm {
        RenderForm::Call("merge")
    }

    fn process(&mut self, inputs: &[f64]) -> f64 {
        match inputs {
            [a, b, ..] => a + b,
            _ => 0.0,
        }
    }
}

/// Absolute value of the argument
pub fn abs(arg: impl Into<Value>) -> UnaryFunction {
    UnaryFunction::new(UnaryKind::Abs, arg)
}

/// Square root of the argument
pub fn sqrt(arg: impl Into<Value>) -> UnaryFunction {
    UnaryFunction::new(UnaryKind::Sqrt, arg)
}

/// First argument raised to the power of the second
pub fn pow(base: impl Into<Value>, exponent: impl Into<Value>) -> Pow {
    Pow::new(base, exponent)
}

/// Sum of two inputs
pub fn merge(a: impl Into<Value>, b: impl Into<Value>) -> Merge {
    Merge::new(a, b)
}
