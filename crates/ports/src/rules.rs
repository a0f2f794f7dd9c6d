//! Rule helpers called by `#[derive(TagValidate)]` output.
//!
//! Rules other than `required` only run on non-zero values, so an empty
//! optional field never fails `email` or `numeric`.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$").ok()
});

/// A field value the rules can inspect.
pub trait FieldValue {
    /// True for the type's zero value (empty text, `0`, `false`, `None`).
    fn is_zero(&self) -> bool;

    /// Text the string rules run against.
    fn rule_text(&self) -> String;
}

impl FieldValue for str {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn rule_text(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn rule_text(&self) -> String {
        self.clone()
    }
}

impl FieldValue for bool {
    fn is_zero(&self) -> bool {
        !*self
    }

    fn rule_text(&self) -> String {
        self.to_string()
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn is_zero(&self) -> bool {
                    *self == 0
                }

                fn rule_text(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_field_value!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl FieldValue for f32 {
    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn rule_text(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for f64 {
    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn rule_text(&self) -> String {
        self.to_string()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn is_zero(&self) -> bool {
        self.as_ref().is_none_or(FieldValue::is_zero)
    }

    fn rule_text(&self) -> String {
        self.as_ref().map(FieldValue::rule_text).unwrap_or_default()
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn rule_text(&self) -> String {
        self.iter()
            .map(FieldValue::rule_text)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl<T: FieldValue + ?Sized> FieldValue for &T {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }

    fn rule_text(&self) -> String {
        (**self).rule_text()
    }
}

/// True when the value is not its type's zero value.
pub fn is_present<T: FieldValue + ?Sized>(value: &T) -> bool {
    !value.is_zero()
}

/// Text form of a value for rule checks and failure messages.
pub fn text<T: FieldValue + ?Sized>(value: &T) -> String {
    value.rule_text()
}

/// Character count within `min..=max`.
#[must_use]
pub fn length(text: &str, min: usize, max: usize) -> bool {
    let count = text.chars().count();
    count >= min && count <= max
}

/// Only ASCII digits.
#[must_use]
pub fn numeric(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|byte| byte.is_ascii_digit())
}

/// A plausible `local@domain.tld` address.
#[must_use]
pub fn email(text: &str) -> bool {
    EMAIL.as_ref().is_some_and(|pattern| pattern.is_match(text))
}
