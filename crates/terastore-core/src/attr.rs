//! Pulse attribute keys and values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Name of the synthetic key representing pulse creation time.
///
/// The backend does not list it among attribute keys, but every pulse has one.
pub const CREATION_DATE_KEY: &str = "date";

/// Value kind of an attribute key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttrKind {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "float")]
    Number,
    #[serde(rename = "date")]
    Date,
}

impl AttrKind {
    /// Data type tag used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrKind::String => "string",
            AttrKind::Number => "float",
            AttrKind::Date => "date",
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttrKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "string" => Ok(AttrKind::String),
            "float" => Ok(AttrKind::Number),
            "date" => Ok(AttrKind::Date),
            other => Err(CoreError::UnhandledAttrKind(other.to_string())),
        }
    }
}

/// A backend attribute name together with its value kind.
///
/// Equality is structural over name and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttrKey {
    name: String,
    kind: AttrKind,
}

impl AttrKey {
    pub fn new(name: impl Into<String>, kind: AttrKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttrKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, AttrKind::Number)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, AttrKind::Date)
    }

    /// The always-present creation-time key.
    pub fn creation_date() -> Self {
        Self::date(CREATION_DATE_KEY)
    }

    /// Build a key from a backend listing entry.
    pub fn from_backend(name: impl Into<String>, data_type: &str) -> Result<Self, CoreError> {
        Ok(Self::new(name, data_type.parse()?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttrKind {
        self.kind
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A value stored under an attribute key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }

    /// Kind implied by the value itself.
    pub fn kind(&self) -> AttrKind {
        match self {
            AttrValue::Number(_) => AttrKind::Number,
            AttrValue::Text(_) => AttrKind::String,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_name_and_kind() {
        let a = AttrKey::string("sample");
        assert_eq!(a, a.clone());
        assert_eq!(a, AttrKey::string("sample"));
        assert_eq!(AttrKey::string("sample"), a);
        assert_ne!(a, AttrKey::number("sample"));
        assert_ne!(a, AttrKey::string("other"));
    }

    #[test]
    fn kind_from_backend_strings() {
        assert_eq!("string".parse::<AttrKind>().unwrap(), AttrKind::String);
        assert_eq!("float".parse::<AttrKind>().unwrap(), AttrKind::Number);
        assert_eq!("date".parse::<AttrKind>().unwrap(), AttrKind::Date);
    }

    #[test]
    fn unknown_kind_is_contract_error() {
        let err = AttrKey::from_backend("blob", "bytes").unwrap_err();
        assert_eq!(err, CoreError::UnhandledAttrKind("bytes".into()));
    }

    #[test]
    fn values_deserialize_untagged() {
        let values: Vec<AttrValue> = serde_json::from_str(r#"["a", 1.5, 2]"#).unwrap();
        assert_eq!(
            values,
            vec![
                AttrValue::Text("a".into()),
                AttrValue::Number(1.5),
                AttrValue::Number(2.0)
            ]
        );
        assert_eq!(values[2].to_string(), "2");
    }
}
