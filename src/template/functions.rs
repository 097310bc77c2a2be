use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

const DEFAULT_DECIMAL_PLACES: i64 = 2;
const MAX_DECIMAL_PLACES: i64 = 15;

/// Names callable from a template action.
pub const FUNCTION_NAMES: &[&str] = &["randInt", "randF64", "randF", "randFrom", "repeat"];

/// A template value: literal, field contents or function result.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Value {
    /// Integers, or strings that parse as one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Str(s) => s.trim().parse().ok(),
            Value::Float(_) => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("{name} expects {expected} arguments, got {got}")]
    Arity {
        name: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("{name}: argument {position} must be {expected}, got {got:?}")]
    ArgumentType {
        name: &'static str,
        position: usize,
        expected: &'static str,
        got: Value,
    },
    #[error("randInt: empty range [{min}, {max})")]
    EmptyRange { min: i64, max: i64 },
    #[error("randFrom: nothing to choose from")]
    EmptyChoice,
    #[error("repeat: negative count {0}")]
    NegativeCount(i64),
    #[error("unknown function {0:?}")]
    Unknown(String),
}

/// Value-generating helpers available to templates.
///
/// Owns its generator so output is reproducible from a seed and independent
/// of any other generator in the process.
pub struct Functions {
    rng: SmallRng,
}

impl Functions {
    pub fn new(rng: SmallRng) -> Self {
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }

    pub fn is_known(name: &str) -> bool {
        FUNCTION_NAMES.contains(&name)
    }

    /// Dispatch a template call by name.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, FunctionError> {
        match name {
            "randInt" => {
                let (min, max) = pair("randInt", args)?;
                let min = int_arg("randInt", 1, min)?;
                let max = int_arg("randInt", 2, max)?;
                self.rand_int(min, max).map(Value::Int)
            }
            "randF64" => {
                let (min, max) = pair("randF64", args)?;
                let min = float_arg("randF64", 1, min)?;
                let max = float_arg("randF64", 2, max)?;
                Ok(Value::Float(self.rand_f64(min, max)))
            }
            "randF" => {
                if !(2..=3).contains(&args.len()) {
                    return Err(FunctionError::Arity {
                        name: "randF",
                        expected: "2 or 3",
                        got: args.len(),
                    });
                }
                let min = float_arg("randF", 1, &args[0])?;
                let max = float_arg("randF", 2, &args[1])?;
                let places = args.get(2).map(|p| int_arg("randF", 3, p)).transpose()?;
                Ok(Value::Float(self.rand_f(min, max, places)))
            }
            "randFrom" => self.rand_from(args).cloned(),
            "repeat" => {
                let (count, text) = pair("repeat", args)?;
                let count = int_arg("repeat", 1, count)?;
                repeat(count, &text.to_string()).map(Value::Str)
            }
            other => Err(FunctionError::Unknown(other.to_string())),
        }
    }

    /// Integer in `[min, max)`.
    pub fn rand_int(&mut self, min: i64, max: i64) -> Result<i64, FunctionError> {
        if max <= min {
            return Err(FunctionError::EmptyRange { min, max });
        }
        Ok(self.rng.gen_range(min..max))
    }

    /// Float in `[min, max)`; `min` itself when the range is empty.
    pub fn rand_f64(&mut self, min: f64, max: f64) -> f64 {
        min + self.rng.gen_range(0.0..1.0) * (max - min)
    }

    /// Float in `[min, max]` rounded to `places` decimals (default 2).
    pub fn rand_f(&mut self, min: f64, max: f64, places: Option<i64>) -> f64 {
        let places = match places {
            Some(p) if p >= 0 => p.min(MAX_DECIMAL_PLACES),
            _ => DEFAULT_DECIMAL_PLACES,
        };
        let multiplier = 10f64.powi(places as i32);
        (self.rand_f64(min, max) * multiplier).round() / multiplier
    }

    pub fn rand_from<'v>(&mut self, choices: &'v [Value]) -> Result<&'v Value, FunctionError> {
        if choices.is_empty() {
            return Err(FunctionError::EmptyChoice);
        }
        Ok(&choices[self.rng.gen_range(0..choices.len())])
    }
}

pub fn repeat(count: i64, text: &str) -> Result<String, FunctionError> {
    let count = usize::try_from(count).map_err(|_| FunctionError::NegativeCount(count))?;
    Ok(text.repeat(count))
}

fn pair<'a>(name: &'static str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), FunctionError> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(FunctionError::Arity {
            name,
            expected: "2",
            got: args.len(),
        }),
    }
}

fn int_arg(name: &'static str, position: usize, value: &Value) -> Result<i64, FunctionError> {
    value.as_int().ok_or_else(|| FunctionError::ArgumentType {
        name,
        position,
        expected: "an integer",
        got: value.clone(),
    })
}

fn float_arg(name: &'static str, position: usize, value: &Value) -> Result<f64, FunctionError> {
    value.as_float().ok_or_else(|| FunctionError::ArgumentType {
        name,
        position,
        expected: "a number",
        got: value.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_rounded(value: f64, places: i32) -> bool {
        let multiplier = 10f64.powi(places);
        (value * multiplier).round() / multiplier == value
    }

    #[test]
    fn test_rand_int_is_half_open() {
        let mut f = Functions::seeded(1);
        for _ in 0..500 {
            let v = f.rand_int(1, 10).unwrap();
            assert!((1..10).contains(&v));
        }
        assert_eq!(f.rand_int(5, 6).unwrap(), 5);
    }

    #[test]
    fn test_rand_int_rejects_empty_range() {
        let mut f = Functions::seeded(1);
        assert_eq!(
            f.rand_int(3, 3).unwrap_err(),
            FunctionError::EmptyRange { min: 3, max: 3 }
        );
    }

    #[test]
    fn test_rand_f_rounds_to_requested_places() {
        let mut f = Functions::seeded(2);
        for _ in 0..100 {
            let v = f.rand_f(1.0, 3.0, None);
            assert!((1.0..=3.0).contains(&v));
            assert!(is_rounded(v, 2));

            let v = f.rand_f(1.0, 3.0, Some(4));
            assert!(is_rounded(v, 4));

            let v = f.rand_f(1.0, 3.0, Some(-1));
            assert!(is_rounded(v, 2));
        }
    }

    #[test]
    fn test_rand_f64_stays_in_range() {
        let mut f = Functions::seeded(3);
        for _ in 0..500 {
            let v = f.rand_f64(1.0, 10.0);
            assert!((1.0..10.0).contains(&v));
        }
        assert_eq!(f.rand_f64(4.0, 4.0), 4.0);
    }

    #[test]
    fn test_rand_from_picks_an_argument() {
        let mut f = Functions::seeded(4);
        let choices = vec![Value::Int(1), Value::Str("two".into()), Value::Float(3.0)];
        let picked = f.rand_from(&choices).unwrap();
        assert!(choices.contains(picked));
        assert_eq!(f.rand_from(&[]).unwrap_err(), FunctionError::EmptyChoice);
    }

    #[test]
    fn test_repeat_concatenates() {
        assert_eq!(repeat(3, "test").unwrap(), "testtesttest");
        assert_eq!(repeat(0, "test").unwrap(), "");
        assert_eq!(repeat(-1, "x").unwrap_err(), FunctionError::NegativeCount(-1));
    }

    #[test]
    fn test_call_dispatches_and_checks_arguments() {
        let mut f = Functions::seeded(5);
        assert_eq!(
            f.call("repeat", &[Value::Int(2), Value::Str("ab".into())]).unwrap(),
            Value::Str("abab".into())
        );
        assert!(matches!(
            f.call("randInt", &[Value::Int(1)]),
            Err(FunctionError::Arity { got: 1, .. })
        ));
        assert!(matches!(
            f.call("randInt", &[Value::Str("low".into()), Value::Int(3)]),
            Err(FunctionError::ArgumentType { position: 1, .. })
        ));
        assert!(matches!(f.call("shout", &[]), Err(FunctionError::Unknown(_))));
        assert!(f.call("randF", &[Value::Int(1), Value::Int(2), Value::Int(3)]).is_ok());
    }

    #[test]
    fn test_string_numbers_are_accepted() {
        let mut f = Functions::seeded(6);
        let v = f
            .call("randInt", &[Value::Str("10".into()), Value::Str("11".into())])
            .unwrap();
        assert_eq!(v, Value::Int(10));
    }

    #[test]
    fn test_values_display_like_text() {
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(2.0).to_string(), "2");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
    }

    #[test]
    fn test_known_functions() {
        assert!(Functions::is_known("randFrom"));
        assert!(!Functions::is_known("printf"));
    }
}
