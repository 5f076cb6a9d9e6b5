//! Response envelope and typed extraction.
//!
//! Vault wraps every payload as `{"data": ..., "warnings": [...]}` (login
//! calls use an `auth` member instead of `data`). [`VaultResponse`] holds
//! one parsed body and hands out typed views of it.

use crate::error::{VaultError, VaultResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Name of the envelope member carrying the payload.
pub const DATA_MEMBER: &str = "data";
/// Name of the envelope member carrying login results.
pub const AUTH_MEMBER: &str = "auth";

/// One parsed response body. Immutable once built.
#[derive(Debug, Clone)]
pub struct VaultResponse {
    path: String,
    status: u16,
    body: Value,
    warnings: Vec<String>,
}

#[derive(Deserialize)]
struct Warnings {
    #[serde(default)]
    warnings: Option<Vec<String>>,
}

impl VaultResponse {
    /// Parse a raw body received from `path` with the given status.
    ///
    /// An empty body (204, or an empty 200) yields an envelope without a
    /// data package.
    ///
    /// # Errors
    ///
    /// [`VaultError::Parse`] when the body is not valid JSON or the
    /// `warnings` member is not a list of strings.
    pub fn from_body(path: &str, status: u16, bytes: &[u8]) -> VaultResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::empty(path, status));
        }

        let body: Value = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::parse(format!("response body from {path}"), e))?;

        let warnings = if body.is_object() {
            Warnings::deserialize(&body)
                .map_err(|e| VaultError::parse(format!("warnings from {path}"), e))?
                .warnings
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_string(),
            status,
            body,
            warnings,
        })
    }

    /// An envelope with no body at all.
    #[must_use]
    pub fn empty(path: &str, status: u16) -> Self {
        Self {
            path: path.to_string(),
            status,
            body: Value::Null,
            warnings: Vec::new(),
        }
    }

    /// Whether the status was 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// HTTP status of the call.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status
    }

    /// Path the call was made against.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Warnings the backend attached, in order.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The whole parsed body.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.body
    }

    /// The `data` member, or `None` when absent or null.
    #[must_use]
    pub fn data_package_opt(&self) -> Option<&Value> {
        self.body.get(DATA_MEMBER).filter(|v| !v.is_null())
    }

    /// The `data` member for calls that require one.
    ///
    /// # Errors
    ///
    /// [`VaultError::MissingData`] when the member is absent or null.
    pub fn data_package(&self) -> VaultResult<&Value> {
        self.member(DATA_MEMBER)
    }

    /// A top level envelope member such as `auth`.
    ///
    /// # Errors
    ///
    /// [`VaultError::MissingData`] when the member is absent or null.
    pub fn member(&self, member: &str) -> VaultResult<&Value> {
        self.body
            .get(member)
            .filter(|v| !v.is_null())
            .ok_or_else(|| VaultError::missing_data(&self.path, member))
    }

    /// A property inside the data package. `Ok(None)` when the property is
    /// not there, `Ok(Some(Value::Null))` when it is there and null.
    ///
    /// # Errors
    ///
    /// [`VaultError::MissingData`] when there is no data package.
    pub fn data_property(&self, key: &str) -> VaultResult<Option<&Value>> {
        Ok(json_property(self.data_package()?, key))
    }

    /// Deserialize the data package into `T`.
    ///
    /// # Errors
    ///
    /// `MissingData` without a data package, `Parse` when the shape does
    /// not fit `T`.
    pub fn typed<T: DeserializeOwned>(&self) -> VaultResult<T> {
        self.typed_member(DATA_MEMBER)
    }

    /// Deserialize a top level member into `T`.
    ///
    /// # Errors
    ///
    /// `MissingData` when the member is absent, `Parse` on shape mismatch.
    pub fn typed_member<T: DeserializeOwned>(&self, member: &str) -> VaultResult<T> {
        let value = self.member(member)?;
        T::deserialize(value)
            .map_err(|e| VaultError::parse(format!("`{member}` from {}", self.path), e))
    }

    /// Deserialize one property of the data package into `T`.
    ///
    /// # Errors
    ///
    /// `MissingData` when either the package or the property is absent,
    /// `Parse` on shape mismatch.
    pub fn typed_property<T: DeserializeOwned>(&self, key: &str) -> VaultResult<T> {
        let value = self
            .data_property(key)?
            .ok_or_else(|| VaultError::missing_data(&self.path, format!("{DATA_MEMBER}.{key}")))?;
        T::deserialize(value)
            .map_err(|e| VaultError::parse(format!("`{key}` from {}", self.path), e))
    }
}

/// Look up `key` in a JSON object.
///
/// `None` means not present; `Some(&Value::Null)` means present and null.
/// Non-object packages never contain properties.
#[must_use]
pub fn json_property<'a>(package: &'a Value, key: &str) -> Option<&'a Value> {
    package.as_object().and_then(|obj| obj.get(key))
}

/// Parse a JSON array into an ordered list of `T`.
///
/// # Errors
///
/// [`VaultError::Parse`] on any malformed element; no partial list is
/// ever returned.
pub fn convert_json_array_to_list<T: DeserializeOwned>(json: &str) -> VaultResult<Vec<T>> {
    serde_json::from_str(json).map_err(|e| VaultError::parse("JSON array", e))
}

/// Like [`convert_json_array_to_list`] for an already parsed value.
///
/// # Errors
///
/// [`VaultError::Parse`] when `value` is not an array of `T`.
pub fn value_to_list<T: DeserializeOwned>(value: &Value) -> VaultResult<Vec<T>> {
    Vec::<T>::deserialize(value).map_err(|e| VaultError::parse("JSON array", e))
}

/// Deserialize `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A field the backend renders as a string, a list of strings, or not at
/// all.
///
/// Parse rules: a JSON string becomes `One`, an array of strings becomes
/// `Many`, `null` or a missing field (with `#[serde(default)]`) becomes
/// `Absent`. Anything else is a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OneOrMany {
    /// Not present.
    #[default]
    Absent,
    /// A single string.
    One(String),
    /// An ordered list of strings.
    Many(Vec<String>),
}

impl OneOrMany {
    /// All values in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Absent => Vec::new(),
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }

    /// Whether there is no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::One(_) => false,
            Self::Many(v) => v.is_empty(),
        }
    }
}

impl<'de> Deserialize<'de> for OneOrMany {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Option::<Repr>::deserialize(deserializer)? {
            None => Self::Absent,
            Some(Repr::One(s)) => Self::One(s),
            Some(Repr::Many(v)) => Self::Many(v),
        })
    }
}

impl Serialize for OneOrMany {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::One(s) => serializer.serialize_str(s),
            Self::Many(v) => v.serialize(serializer),
        }
    }
}
