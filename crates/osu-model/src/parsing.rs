// Range-checked scalar parsing and the legacy rounding rules.
//
// Every scalar read from a map file goes through here so that an
// out-of-window value is rejected the same way everywhere.

use std::num::IntErrorKind;

use crate::error::{Error, Result};

/// Default magnitude limit for parsed numbers.
pub const MAX_PARSE_VALUE: i32 = i32::MAX;

/// Magnitude limit for playfield and storyboard coordinates.
pub const MAX_COORDINATE_VALUE: i32 = 131_072;

/// Distance from a .5 fraction under which a value counts as a midpoint.
const MIDPOINT_EPSILON: f64 = 1e-15;

pub fn parse_int(text: &str) -> Result<i32> {
    parse_int_within(text, MAX_PARSE_VALUE)
}

/// Parses a signed integer whose magnitude must not exceed `limit`.
pub fn parse_int_within(text: &str, limit: i32) -> Result<i32> {
    let trimmed = text.trim();
    let value = match trimmed.parse::<i64>() {
        Ok(value) => value,
        Err(e) => {
            return match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    Err(Error::range(format!("{trimmed} does not fit an integer")))
                }
                _ => Err(Error::format(format!("{trimmed:?} is not an integer"))),
            };
        }
    };
    let limit = i64::from(limit);
    if value < -limit || value > limit {
        return Err(Error::range(format!("{value} exceeds the limit of {limit}")));
    }
    Ok(value as i32)
}

pub fn parse_float(text: &str) -> Result<f32> {
    parse_float_within(text, MAX_PARSE_VALUE as f32, false)
}

/// Parses a single-precision number. NaN is only accepted with `allow_nan`.
pub fn parse_float_within(text: &str, limit: f32, allow_nan: bool) -> Result<f32> {
    let trimmed = text.trim();
    let value: f32 = trimmed
        .parse()
        .map_err(|_| Error::format(format!("{trimmed:?} is not a number")))?;
    if value < -limit || value > limit {
        return Err(Error::range(format!("{trimmed} exceeds the limit of {limit}")));
    }
    if value.is_nan() && !allow_nan {
        return Err(Error::format("NaN is not allowed here"));
    }
    Ok(value)
}

pub fn parse_double(text: &str) -> Result<f64> {
    parse_double_within(text, f64::from(MAX_PARSE_VALUE), false)
}

/// Double-precision counterpart of [`parse_float_within`].
pub fn parse_double_within(text: &str, limit: f64, allow_nan: bool) -> Result<f64> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| Error::format(format!("{trimmed:?} is not a number")))?;
    if value < -limit || value > limit {
        return Err(Error::range(format!("{trimmed} exceeds the limit of {limit}")));
    }
    if value.is_nan() && !allow_nan {
        return Err(Error::format("NaN is not allowed here"));
    }
    Ok(value)
}

/// Parses an integer in `0..=255`.
pub fn parse_byte(text: &str) -> Result<u8> {
    let value = parse_int(text)?;
    u8::try_from(value).map_err(|_| Error::range(format!("{value} is not a byte value")))
}

/// Enumerations stored in the legacy formats, addressable by number or by name.
pub trait LegacyEnum: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn value(self) -> i32;

    fn name(self) -> &'static str;

    fn from_value(value: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.value() == value)
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.name() == name)
    }
}

/// Accepts either the numeric value or the exact variant name.
pub fn parse_enum<E: LegacyEnum>(text: &str) -> Result<E> {
    let trimmed = text.trim();
    let found = match trimmed.parse::<i32>() {
        Ok(value) => E::from_value(value),
        Err(_) => E::from_name(trimmed),
    };
    found.ok_or_else(|| {
        Error::format(format!(
            "{trimmed:?} is not a valid {}",
            std::any::type_name::<E>().rsplit("::").next().unwrap_or("value")
        ))
    })
}

fn is_at_midpoint(x: f64) -> bool {
    (0.5 - (x - x.trunc()).abs()).abs() <= MIDPOINT_EPSILON
}

/// Rounds to the nearest integer, resolving midpoints to the even neighbour.
pub fn round_to_even(x: f64) -> f64 {
    if !is_at_midpoint(x) {
        return x.round();
    }
    let toward_zero = x.trunc();
    if toward_zero % 2.0 == 0.0 {
        toward_zero
    } else {
        toward_zero + x.signum()
    }
}

/// Rounds to the nearest integer, resolving midpoints away from zero.
pub fn round_away_from_zero(x: f64) -> f64 {
    if is_at_midpoint(x) {
        x.trunc() + x.signum()
    } else {
        x.round()
    }
}

/// Declares a fieldless enum together with its [`LegacyEnum`] table.
macro_rules! legacy_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::parsing::LegacyEnum for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn value(self) -> i32 {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

pub(crate) use legacy_enum;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    legacy_enum! {
        enum Fruit {
            Apple = 0,
            Pear = 1,
            Plum = 7,
        }
    }

    #[test]
    fn test_parse_int_bounds() {
        assert_eq!(parse_int("2147483647").unwrap(), i32::MAX);
        assert_eq!(parse_int(" -42 ").unwrap(), -42);
        assert_eq!(parse_int("2147483648").unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(parse_int("-2147483648").unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(
            parse_int("99999999999999999999").unwrap_err().kind(),
            ErrorKind::Range
        );
        assert_eq!(parse_int("12a").unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(parse_int("").unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(parse_int("1.5").unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_int_custom_limit() {
        assert_eq!(parse_int_within("131072", MAX_COORDINATE_VALUE).unwrap(), 131072);
        assert_eq!(
            parse_int_within("131073", MAX_COORDINATE_VALUE).unwrap_err().kind(),
            ErrorKind::Range
        );
    }

    #[test]
    fn test_parse_byte_bounds() {
        assert_eq!(parse_byte("0").unwrap(), 0);
        assert_eq!(parse_byte("255").unwrap(), 255);
        assert_eq!(parse_byte("256").unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(parse_byte("-1").unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(parse_byte("x").unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_float_nan_and_infinity() {
        assert_eq!(parse_float("NaN").unwrap_err().kind(), ErrorKind::Format);
        assert!(parse_float_within("NaN", 10.0, true).unwrap().is_nan());
        assert_eq!(parse_float("inf").unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(parse_double("1e300").unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(parse_double("-333.33").unwrap(), -333.33);
        assert_eq!(parse_float("abc").unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_enum_by_value_and_name() {
        assert_eq!(parse_enum::<Fruit>("7").unwrap(), Fruit::Plum);
        assert_eq!(parse_enum::<Fruit>("Pear").unwrap(), Fruit::Pear);
        assert_eq!(parse_enum::<Fruit>("pear").unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(parse_enum::<Fruit>("3").unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(Fruit::Plum.value(), 7);
        assert_eq!(Fruit::Apple.name(), "Apple");
    }

    #[test]
    fn test_round_to_even() {
        assert_eq!(round_to_even(0.5), 0.0);
        assert_eq!(round_to_even(1.5), 2.0);
        assert_eq!(round_to_even(2.5), 2.0);
        assert_eq!(round_to_even(-1.5), -2.0);
        assert_eq!(round_to_even(-2.5), -2.0);
        assert_eq!(round_to_even(2.6), 3.0);
        assert_eq!(round_to_even(2.4), 2.0);
    }

    #[test]
    fn test_round_away_from_zero() {
        assert_eq!(round_away_from_zero(0.5), 1.0);
        assert_eq!(round_away_from_zero(-0.5), -1.0);
        assert_eq!(round_away_from_zero(2.5), 3.0);
        assert_eq!(round_away_from_zero(-2.4), -2.0);
    }

    #[test]
    fn test_midpoint_tolerance() {
        // 0.1 + 0.2 + 0.2 lands a hair off 0.5 in binary floating point
        let almost_half = 0.1 + 0.2 + 0.2;
        assert_eq!(round_to_even(almost_half), 0.0);
        assert_eq!(round_to_even(1.5 + 1e-10), 2.0);
        assert_eq!(round_to_even(2.5 + 1e-10), 3.0);
    }

    proptest! {
        #[test]
        fn prop_rounding_modes_agree_off_midpoint(n in -10_000i32..10_000, frac in 0.01f64..0.49) {
            let below = f64::from(n) + frac;
            prop_assert_eq!(round_to_even(below), round_away_from_zero(below));
        }

        #[test]
        fn prop_round_to_even_lands_on_even_at_midpoint(n in -10_000i32..10_000) {
            let x = f64::from(n) + 0.5;
            prop_assert_eq!(round_to_even(x) % 2.0, 0.0);
            prop_assert!((round_to_even(x) - x).abs() <= 0.5);
        }

        #[test]
        fn prop_parse_int_accepts_display(n in any::<i32>().prop_filter("limit", |v| *v != i32::MIN)) {
            prop_assert_eq!(parse_int(&n.to_string()).unwrap(), n);
        }
    }
}
