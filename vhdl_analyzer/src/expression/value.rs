// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use std::fmt;

/// A statically known value
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    /// The position of an enumeration literal, `boolean` included
    Enum(usize),
    Char(char),
    /// String and bit string literals
    Str(String),
    Null,
    Array(Vec<Value>),
}

impl Value {
    pub fn boolean(value: bool) -> Value {
        Value::Enum(usize::from(value))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Enum(ordinal) => i64::try_from(*ordinal).ok(),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// The value of `boolean` and `bit` conditions
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Enum(ordinal) => Some(*ordinal != 0),
            Value::Char('1') => Some(true),
            Value::Char('0') => Some(false),
            _ => None,
        }
    }

    /// The number of elements of array values
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(text) => Some(text.chars().count()),
            Value::Array(elements) => Some(elements.len()),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<Vec<Value>> {
        match self {
            Value::Str(text) => Some(text.chars().map(Value::Char).collect()),
            Value::Array(elements) => Some(elements.clone()),
            _ => None,
        }
    }

    /// Concatenation of arrays and elements
    pub fn concat(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Str(left), Value::Str(right)) => Value::Str(format!("{left}{right}")),
            (Value::Str(left), Value::Char(right)) => Value::Str(format!("{left}{right}")),
            (Value::Char(left), Value::Str(right)) => Value::Str(format!("{left}{right}")),
            (Value::Char(left), Value::Char(right)) => Value::Str(format!("{left}{right}")),
            _ => {
                let mut elements = self.elements().unwrap_or_else(|| vec![self.clone()]);
                elements.extend(other.elements().unwrap_or_else(|| vec![other.clone()]));
                Value::Array(elements)
            }
        }
    }

    /// Ordering of scalar values and lexical ordering of arrays
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
            (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Null, Value::Null) => Some(std::cmp::Ordering::Equal),
            _ => self.as_real()?.partial_cmp(&other.as_real()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Real(value) => write!(f, "{value:?}"),
            Value::Enum(ordinal) => write!(f, "{ordinal}"),
            Value::Char(chr) => write!(f, "'{chr}'"),
            Value::Str(text) => write!(f, "\"{text}\""),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn concat_strings_and_characters() {
        assert_eq!(
            Value::Str("101".to_owned()).concat(&Value::Char('0')),
            Value::Str("1010".to_owned())
        );
        assert_eq!(
            Value::Integer(1).concat(&Value::Array(vec![Value::Integer(2)])),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn mixed_numeric_compare() {
        assert_eq!(
            Value::Integer(1).compare(&Value::Real(1.5)),
            Some(std::cmp::Ordering::Less)
        );
        assert_eq!(Value::Char('a').compare(&Value::Integer(1)), None);
    }
}
