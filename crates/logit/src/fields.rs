//! Extra key/value pairs attached to a record

use std::fmt;

/// A structured key/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: String,
}

/// Build a [`Field`] from anything displayable
pub fn field(key: impl Into<String>, value: impl fmt::Display) -> Field {
    Field {
        key: key.into(),
        value: value.to_string(),
    }
}

/// Renders fields as `key=value` pairs separated by spaces.
/// Values containing whitespace, quotes or `=` are quoted.
pub(crate) struct Fields<'a>(pub &'a [Field]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let needs_quotes = field.value.is_empty()
                || field
                    .value
                    .chars()
                    .any(|c| c.is_whitespace() || c == '"' || c == '=');
            if needs_quotes {
                write!(f, "{}={:?}", field.key, field.value)?;
            } else {
                write!(f, "{}={}", field.key, field.value)?;
            }
        }
        Ok(())
    }
}
