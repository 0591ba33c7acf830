//! Number plugins

use super::{value, FromConfig};
use crate::error::{Error, Result};
use crate::item::TamperableItem;
use crate::tamper::types::{settings, Tamper, Tampered};
use crate::types::{number_value, JsonValue};
use serde::Deserialize;

/// Arithmetic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathOperation {
    #[default]
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MathSettings {
    operation: MathOperation,
    flip: bool,
    value: f64,
    skip_on_nan: bool,
}

/// Apply an arithmetic operation with a configured operand
///
/// `flip` swaps the operands. Null, booleans and empty strings count as 0
/// unless `skip_on_nan` is set, in which case any non-numeric input passes
/// through unchanged.
#[derive(Debug, Clone)]
pub struct Math {
    operation: MathOperation,
    flip: bool,
    operand: f64,
    skip_on_nan: bool,
}

impl Math {
    /// Create a math plugin
    pub fn new(operation: MathOperation, operand: f64) -> Self {
        Self {
            operation,
            flip: false,
            operand,
            skip_on_nan: false,
        }
    }

    /// Swap the operands
    #[must_use]
    pub fn flipped(mut self) -> Self {
        self.flip = true;
        self
    }
}

impl FromConfig for Math {
    fn from_config(config: &JsonValue) -> Result<Self> {
        let s: MathSettings = settings("math", config)?;
        Ok(Self {
            operation: s.operation,
            flip: s.flip,
            operand: s.value,
            skip_on_nan: s.skip_on_nan,
        })
    }
}

fn numeric(data: &JsonValue) -> Option<f64> {
    match data {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

impl Tamper for Math {
    fn tamper(&self, data: JsonValue, _item: Option<&mut dyn TamperableItem>) -> Result<Tampered> {
        let number = match numeric(&data) {
            Some(n) => n,
            None if self.skip_on_nan => return value(data),
            None => match &data {
                JsonValue::Null => 0.0,
                JsonValue::Bool(b) => f64::from(u8::from(*b)),
                JsonValue::String(s) if s.is_empty() => 0.0,
                _ => {
                    return Err(Error::tamper(
                        "Math plugin failed because data was not numeric.",
                    ))
                }
            },
        };

        let (left, right) = if self.flip {
            (self.operand, number)
        } else {
            (number, self.operand)
        };

        let result = match self.operation {
            MathOperation::Addition => left + right,
            MathOperation::Subtraction => left - right,
            MathOperation::Multiplication => left * right,
            MathOperation::Division => {
                if right == 0.0 {
                    return Err(Error::tamper(
                        "Math plugin failed because divide by zero was attempted.",
                    ));
                }
                left / right
            }
        };

        value(number_value(result))
    }
}
