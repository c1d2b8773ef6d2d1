//! Scalar fields. Values are coerced loosely on input and checked strictly by `validate`.

use super::{impl_field_builder, Field, FieldOptions};
use crate::error::{DocResult, DocumentError};
use crate::value::FieldValue;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

macro_rules! scalar_field {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            options: FieldOptions,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl_field_builder!($name);
    };
}

scalar_field!(
    /// UTF-8 text
    StringField
);
scalar_field!(
    /// Text shaped like `local@domain.tld`
    EmailField
);
scalar_field!(
    /// 64-bit integer
    IntField
);
scalar_field!(FloatField);
scalar_field!(BooleanField);
scalar_field!(
    /// Timestamp stored as RFC 3339 text in UTC
    DateTimeField
);

fn mismatch(expected: &str, value: &Value) -> DocumentError {
    DocumentError::invalid("", format!("expected {expected}, got {value}"))
}

fn check_string(value: &Value) -> DocResult<&str> {
    value.as_str().ok_or_else(|| mismatch("a string", value))
}

impl Field for StringField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["string"]
    }

    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        Ok(FieldValue::Plain(match value {
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => other,
        }))
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        check_string(value).map(|_| ())
    }

    fn sample(&self) -> FieldValue {
        FieldValue::Plain(Value::String("string".to_string()))
    }
}

impl Field for EmailField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["email", "string"]
    }

    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        Ok(FieldValue::Plain(match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        }))
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        let text = check_string(value)?;
        let valid = match text.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };
        if valid {
            Ok(())
        } else {
            Err(DocumentError::invalid("", format!("{text} is not a valid email address")))
        }
    }

    fn sample(&self) -> FieldValue {
        FieldValue::Plain(Value::String("user@example.com".to_string()))
    }
}

impl Field for IntField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["int", "number"]
    }

    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        Ok(FieldValue::Plain(match value {
            Value::String(s) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            Value::Number(n) if n.is_f64() => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(f as i64),
                _ => Value::Number(n),
            },
            other => other,
        }))
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        if value.is_i64() || value.is_u64() {
            Ok(())
        } else {
            Err(mismatch("an integer", value))
        }
    }

    fn sample(&self) -> FieldValue {
        FieldValue::Plain(Value::from(1))
    }
}

impl Field for FloatField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["float", "number"]
    }

    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        Ok(FieldValue::Plain(match value {
            Value::String(s) => match s.trim().parse::<f64>().ok().and_then(Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(s),
            },
            Value::Number(n) if !n.is_f64() => {
                n.as_f64().and_then(Number::from_f64).map(Value::Number).unwrap_or(Value::Number(n))
            }
            other => other,
        }))
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        if value.is_number() {
            Ok(())
        } else {
            Err(mismatch("a number", value))
        }
    }

    fn sample(&self) -> FieldValue {
        FieldValue::Plain(Value::from(1.5))
    }
}

impl Field for BooleanField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["boolean"]
    }

    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        Ok(FieldValue::Plain(match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Value::Bool(true),
                "false" | "no" | "0" => Value::Bool(false),
                _ => Value::String(s),
            },
            Value::Number(n) if n.as_i64() == Some(0) => Value::Bool(false),
            Value::Number(n) if n.as_i64() == Some(1) => Value::Bool(true),
            other => other,
        }))
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        if value.is_boolean() {
            Ok(())
        } else {
            Err(mismatch("a boolean", value))
        }
    }

    fn sample(&self) -> FieldValue {
        FieldValue::Plain(Value::Bool(true))
    }
}

fn normalize_datetime(text: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

impl Field for DateTimeField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn lineage(&self) -> &'static [&'static str] {
        &["datetime"]
    }

    fn guess_value(&self, value: Value) -> DocResult<FieldValue> {
        Ok(FieldValue::Plain(match value {
            Value::String(s) => match normalize_datetime(&s) {
                Some(normalized) => Value::String(normalized),
                None => Value::String(s),
            },
            Value::Number(n) => match n.as_i64().and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)) {
                Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                None => Value::Number(n),
            },
            other => other,
        }))
    }

    fn validate(&self, value: &Value) -> DocResult<()> {
        let text = check_string(value)?;
        match DateTime::parse_from_rfc3339(text) {
            Ok(_) => Ok(()),
            Err(e) => Err(DocumentError::invalid("", format!("{text} is not an RFC 3339 timestamp: {e}"))),
        }
    }

    fn sample(&self) -> FieldValue {
        FieldValue::Plain(Value::String("2024-01-01T00:00:00Z".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn guessed(field: &dyn Field, value: Value) -> Value {
        field.guess_value(value).unwrap().internal().clone()
    }

    #[test]
    fn coerces_text_input() {
        assert_eq!(guessed(&IntField::new(), json!(" 42 ")), json!(42));
        assert_eq!(guessed(&IntField::new(), json!(7.0)), json!(7));
        assert_eq!(guessed(&FloatField::new(), json!("2.5")), json!(2.5));
        assert_eq!(guessed(&BooleanField::new(), json!("Yes")), json!(true));
        assert_eq!(guessed(&BooleanField::new(), json!(0)), json!(false));
        assert_eq!(guessed(&StringField::new(), json!(12)), json!("12"));
    }

    #[test]
    fn leaves_unparseable_input_for_validation() {
        let field = IntField::new();
        let value = guessed(&field, json!("twelve"));
        assert_eq!(value, json!("twelve"));
        assert!(field.validate(&value).is_err());
    }

    #[test]
    fn datetimes_normalize_to_utc() {
        let field = DateTimeField::new();
        assert_eq!(guessed(&field, json!("2024-03-01T10:00:00+02:00")), json!("2024-03-01T08:00:00Z"));
        assert_eq!(guessed(&field, json!(0)), json!("1970-01-01T00:00:00Z"));
        assert!(field.validate(&json!("2024-03-01T08:00:00Z")).is_ok());
        assert!(field.validate(&json!("yesterday")).is_err());
    }

    #[test]
    fn email_shape() {
        let field = EmailField::new();
        assert!(field.validate(&json!("a@b.io")).is_ok());
        assert!(field.validate(&json!("a@b")).is_err());
        assert!(field.validate(&json!("@b.io")).is_err());
        assert!(field.validate(&json!("a@@b.io")).is_err());
        assert_eq!(field.lineage(), &["email", "string"]);
        assert!(field.is_kind("string"));
    }

    #[test]
    fn samples_validate() {
        let fields: Vec<Box<dyn Field>> = vec![
            Box::new(StringField::new()),
            Box::new(EmailField::new()),
            Box::new(IntField::new()),
            Box::new(FloatField::new()),
            Box::new(BooleanField::new()),
            Box::new(DateTimeField::new()),
        ];
        for field in fields {
            let sample = field.sample();
            assert!(field.validate(sample.internal()).is_ok(), "{}", field.kind());
        }
    }
}
