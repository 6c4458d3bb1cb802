// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lenient numeric fields.
//!
//! Browser forms and the docs console submit numbers as strings. Fields that
//! opt in with `deserialize_with` accept either a JSON number or a string
//! holding one, and always store the number. Anything else (booleans,
//! objects, non-numeric text) is still a type error.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Int(i64),
    Float(f64),
    Text(String),
}

/// `f` as an `i64`, if it is integral and in range.
fn integral(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

impl NumberOrText {
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            NumberOrText::Int(n) => Ok(n),
            NumberOrText::Float(f) => {
                integral(f).ok_or_else(|| E::custom(format!("expected an integer, got {f}")))
            }
            NumberOrText::Text(s) => {
                let text = s.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(integral))
                    .ok_or_else(|| E::custom(format!("expected an integer, got \"{s}\"")))
            }
        }
    }

    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrText::Int(n) => Ok(n as f64),
            NumberOrText::Float(f) => Ok(f),
            NumberOrText::Text(s) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(f),
                _ => Err(E::custom(format!("expected a number, got \"{s}\""))),
            },
        }
    }
}

fn untyped<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NumberOrText, D::Error> {
    NumberOrText::deserialize(deserializer)
        .map_err(|_| D::Error::custom("expected a number or a numeric string"))
}

pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    untyped(deserializer)?.into_i64()
}

pub fn opt_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<NumberOrText>::deserialize(deserializer)
        .map_err(|_| D::Error::custom("expected a number or a numeric string"))?
    {
        Some(value) => value.into_i64().map(Some),
        None => Ok(None),
    }
}

pub fn opt_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumberOrText>::deserialize(deserializer)
        .map_err(|_| D::Error::custom("expected a number or a numeric string"))?
    {
        Some(value) => value.into_f64().map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::integer")]
        orbs: i64,
        #[serde(default, deserialize_with = "super::opt_float")]
        height: Option<f64>,
        #[serde(default, deserialize_with = "super::opt_integer")]
        year: Option<i64>,
    }

    #[test]
    fn string_and_number_store_the_same_value() {
        let from_text: Sample = serde_json::from_str(r#"{"orbs":"2"}"#).unwrap();
        let from_number: Sample = serde_json::from_str(r#"{"orbs":2}"#).unwrap();
        assert_eq!(from_text.orbs, 2);
        assert_eq!(from_text.orbs, from_number.orbs);
    }

    #[test]
    fn optional_fields_coerce_and_default() {
        let sample: Sample =
            serde_json::from_str(r#"{"orbs":1,"height":"1.82","year":" 1204 "}"#).unwrap();
        assert_eq!(sample.height, Some(1.82));
        assert_eq!(sample.year, Some(1204));

        let sample: Sample = serde_json::from_str(r#"{"orbs":1,"height":null}"#).unwrap();
        assert_eq!(sample.height, None);
        assert_eq!(sample.year, None);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":"two"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":true}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":2.5}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":1,"height":"tall"}"#).is_err());
    }

    #[test]
    fn integral_floats_coerce_the_same_as_text() {
        let from_number: Sample = serde_json::from_str(r#"{"orbs":2.0}"#).unwrap();
        let from_text: Sample = serde_json::from_str(r#"{"orbs":"2.0"}"#).unwrap();
        assert_eq!(from_number.orbs, 2);
        assert_eq!(from_text.orbs, 2);
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":"2.5"}"#).is_err());
    }

    #[test]
    fn out_of_range_integers_are_rejected() {
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":1e20}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":"1e20"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":-1e20}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":18446744073709551615}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"orbs":"NaN"}"#).is_err());
    }
}
