//! JSON output formatting shared by every response writer

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// How JSON bodies are laid out on the wire.
///
/// `indent: None` produces compact output; `Some(indent)` produces one member per line,
/// nested levels prefixed with `indent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFormat {
    pub indent: Option<String>,
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self::indented("\t")
    }
}

impl JsonFormat {
    pub fn compact() -> Self {
        Self { indent: None }
    }

    pub fn indented(indent: impl Into<String>) -> Self {
        Self {
            indent: Some(indent.into()),
        }
    }

    /// Parse an indentation setting such as `JSON_INDENT`.
    ///
    /// `none` (any case) and the empty string select compact output. The two-character
    /// sequences `\t` and `\n` are unescaped so tabs can be given in `.env` files.
    pub fn from_setting(raw: &str) -> Self {
        if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
            return Self::compact();
        }
        Self::indented(raw.replace("\\t", "\t").replace("\\n", "\n"))
    }

    /// Serialize `value` with this format.
    pub fn to_vec<T>(&self, value: &T) -> serde_json::Result<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        match &self.indent {
            None => serde_json::to_vec(value),
            Some(indent) => {
                let mut out = Vec::with_capacity(128);
                let formatter = PrettyFormatter::with_indent(indent.as_bytes());
                let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
                value.serialize(&mut serializer)?;
                Ok(out)
            }
        }
    }
}
