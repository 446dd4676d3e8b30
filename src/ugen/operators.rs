//! Variadic infix operators
//!
//! `add`, `sub`, `mul`, `div` and `modulo` accept any number (at least one)
//! of scalars or nodes. `Add(1, 2, 3, 4)` outputs 10; oscillators can be
//! stacked the same way.

use super::node::{NodeCore, RenderForm, UnitGenerator};
use super::value::{Properties, Value};
use crate::error::{Result, UgenError};
use crate::impl_ugen_common;

/// Arithmetic operator symbol family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    /// Constructor name of the operator node
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
        }
    }

    /// Look up an operator by constructor name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "add" => Some(BinaryOp::Add),
            "sub" => Some(BinaryOp::Sub),
            "mul" => Some(BinaryOp::Mul),
            "div" => Some(BinaryOp::Div),
            "mod" => Some(BinaryOp::Mod),
            _ => None,
        }
    }

    #[inline]
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Mod => a % b,
        }
    }
}

/// Node rendering a left-associated infix chain
#[derive(Debug)]
pub struct Operator {
    core: NodeCore,
    op: BinaryOp,
}

impl Operator {
    /// Build an operator over `args`, stored at keys `0..n-1`
    ///
    /// Fails when `args` is empty.
    pub fn new<I>(op: BinaryOp, args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let properties = Properties::positional(args.into_iter().map(Into::into));
        if properties.is_empty() {
            return Err(UgenError::EmptyOperator {
                operator: op.symbol(),
            });
        }

        Ok(Self {
            core: NodeCore::new(op.name(), properties),
            op,
        })
    }

    pub fn op(&self) -> BinaryOp {
        self.op
    }
}

impl UnitGenerator for Operator {
    impl_ugen_common!();

    fn form(&self) -> RenderForm {
        RenderForm::Infix(self.op.symbol())
    }

    fn process(&mut self, inputs: &[f64]) -> f64 {
        let mut iter = inputs.iter().copied();
        match iter.next() {
            Some(first) => iter.fold(first, |acc, v| self.op.apply(acc, v)),
            None => 0.0,
        }
    }
}

/// Sum of all arguments
pub fn add<I>(args: I) -> Result<Operator>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Operator::new(BinaryOp::Add, args)
}

/// First argument minus all subsequent arguments
pub fn sub<I>(args: I) -> Result<Operator>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Operator::new(BinaryOp::Sub, args)
}

/// Product of all arguments
pub fn mul<I>(args: I) -> Result<Operator>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Operator::new(BinaryOp::Mul, args)
}

/// First argument divided by all subsequent arguments
pub fn div<I>(args: I) -> Result<Operator>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Operator::new(BinaryOp::Div, args)
}

/// Remainder of the first argument by all subsequent arguments
pub fn modulo<I>(args: I) -> Result<Operator>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    Operator::new(BinaryOp::Mod, args)
}
