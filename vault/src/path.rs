//! Name and path addressing for Vault objects.
//!
//! Every object the backend exposes is addressed by a `name` that lives
//! under an optional, slash separated `path`. Callers hand these in many
//! shapes (full paths, bare names, names with embedded segments), so the
//! helpers here fold them into one canonical form before any request is
//! built.

use crate::error::{VaultError, VaultResult};
use std::fmt;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Returns the final segment of `full_path`.
///
/// A single trailing separator is ignored, so `"name/"` yields `"name"`.
/// When no separator is present the whole input is the name.
#[must_use]
pub fn name_from_path(full_path: &str) -> &str {
    name_and_path_tuple(full_path).1
}

/// Returns everything before the final segment of `full_path`, without
/// leading or trailing separators. Empty when there is no parent segment.
#[must_use]
pub fn path_from_path(full_path: &str) -> &str {
    name_and_path_tuple(full_path).0
}

/// Splits `full_path` into `(path, name)` in one pass.
///
/// Agrees with [`path_from_path`] and [`name_from_path`] for every input.
#[must_use]
pub fn name_and_path_tuple(full_path: &str) -> (&str, &str) {
    let trimmed = full_path.strip_suffix(SEPARATOR).unwrap_or(full_path);
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => (
            trimmed[..idx].trim_matches(SEPARATOR),
            &trimmed[idx + SEPARATOR.len_utf8()..],
        ),
        None => ("", trimmed),
    }
}

/// Combines a caller supplied `name` and `path` into `(path, name)`.
///
/// `name` may carry embedded segments (`"root/secret"`); those become the
/// path when `path` is empty. Supplying both an explicit `path` and a
/// `name` with embedded segments is ambiguous and fails with
/// [`VaultError::InvalidArgument`].
///
/// # Errors
///
/// Returns `InvalidArgument` on the conflicting combination above.
pub fn name_and_path_from_values(name: &str, path: &str) -> VaultResult<(String, String)> {
    let name = name.trim_matches(SEPARATOR);
    let path = path.trim_matches(SEPARATOR);

    let Some(idx) = name.rfind(SEPARATOR) else {
        return Ok((path.to_string(), name.to_string()));
    };

    if !path.is_empty() {
        return Err(VaultError::invalid_argument(format!(
            "name [{name}] already contains path segments and cannot be combined with path [{path}]"
        )));
    }

    let embedded = name[..idx].trim_matches(SEPARATOR);
    let real_name = &name[idx + SEPARATOR.len_utf8()..];
    Ok((embedded.to_string(), real_name.to_string()))
}

/// Joins `path` and `name`, omitting the separator when `path` is empty.
#[must_use]
pub fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}{SEPARATOR}{name}")
    }
}

/// A normalised object address.
///
/// `name` never contains a separator and `path` never starts or ends with
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    name: String,
    path: String,
}

impl Address {
    /// Builds an address from a name (possibly carrying embedded segments)
    /// and an explicit path.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the combination is ambiguous or the name is
    /// empty after normalisation.
    pub fn new(name: &str, path: &str) -> VaultResult<Self> {
        let (path, name) = name_and_path_from_values(name, path)?;
        if name.is_empty() {
            return Err(VaultError::invalid_argument("object name must not be empty"));
        }
        Ok(Self { name, path })
    }

    /// Parses a full path such as `"secret/app/db"`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when no name segment remains.
    pub fn parse(full_path: &str) -> VaultResult<Self> {
        let (path, name) = name_and_path_tuple(full_path.trim_start_matches(SEPARATOR));
        if name.is_empty() {
            return Err(VaultError::invalid_argument(format!(
                "[{full_path}] does not contain an object name"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            path: path.to_string(),
        })
    }

    /// The final segment.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent segments, possibly empty.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `path/name`, or just `name` when the path is empty.
    #[must_use]
    pub fn full_path(&self) -> String {
        join(&self.path, &self.name)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}{SEPARATOR}{}", self.path, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_path() {
        assert_eq!(name_from_path("/root/path1/path2/name"), "name");
        assert_eq!(name_from_path("name"), "name");
        assert_eq!(name_from_path("name/"), "name");
        assert_eq!(name_from_path("a/b/"), "b");
    }

    #[test]
    fn test_path_from_path() {
        assert_eq!(path_from_path("/root/path1/path2/name"), "root/path1/path2");
        assert_eq!(path_from_path("name"), "");
        assert_eq!(path_from_path("name/"), "");
        assert_eq!(path_from_path("/name"), "");
    }

    #[test]
    fn test_tuple_matches_individual_calls() {
        for input in ["/root/path1/path2/name", "name", "name/", "a/b", "/a/b/c/"] {
            assert_eq!(
                name_and_path_tuple(input),
                (path_from_path(input), name_from_path(input)),
                "input {input}"
            );
        }
    }

    #[test]
    fn test_values_embedded_path() {
        let (path, name) = name_and_path_from_values("root/namePart", "").unwrap();
        assert_eq!(path, "root");
        assert_eq!(name, "namePart");
    }

    #[test]
    fn test_values_explicit_path_is_trimmed() {
        let (path, name) = name_and_path_from_values("namePart", "/root/patha/").unwrap();
        assert_eq!(path, "root/patha");
        assert_eq!(name, "namePart");
    }

    #[test]
    fn test_values_bare_name() {
        let (path, name) = name_and_path_from_values("/namePart/", "").unwrap();
        assert_eq!(path, "");
        assert_eq!(name, "namePart");
    }

    #[test]
    fn test_values_multiple_embedded_segments() {
        let (path, name) = name_and_path_from_values("a/b/c/namePart", "").unwrap();
        assert_eq!(path, "a/b/c");
        assert_eq!(name, "namePart");
    }

    #[test]
    fn test_values_conflict_fails() {
        let err = name_and_path_from_values("path2/path3/namePart", "root/path4").unwrap_err();
        assert!(matches!(err, VaultError::InvalidArgument(_)));
    }

    #[test]
    fn test_address() {
        let addr = Address::new("app/db", "").unwrap();
        assert_eq!(addr.path(), "app");
        assert_eq!(addr.name(), "db");
        assert_eq!(addr.full_path(), "app/db");
        assert_eq!(addr.to_string(), "app/db");

        let bare = Address::parse("db").unwrap();
        assert_eq!(bare.full_path(), "db");

        assert!(Address::new("/", "").is_err());
        assert!(Address::parse("").is_err());
    }
}
