//! Vault token record.

use crate::login::LoginResponse;
use crate::response::{OneOrMany, null_as_default};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Token flavour reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Persisted, renewable, can own children.
    #[default]
    Service,
    /// Lightweight, not persisted.
    Batch,
    /// Anything this client does not know.
    #[serde(other)]
    Unknown,
}

/// A token as returned by `auth/token/lookup*`.
///
/// Only [`Token::refresh_from`] and the orphan setters mutate a token after
/// construction.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Token {
    id: String,
    #[serde(default)]
    accessor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    policies: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    identity_policies: BTreeSet<String>,
    #[serde(default)]
    renewable: bool,
    #[serde(default)]
    entity_id: String,
    #[serde(default, rename = "meta", deserialize_with = "null_as_default")]
    metadata: BTreeMap<String, String>,
    #[serde(default, with = "chrono::serde::ts_seconds")]
    creation_time: DateTime<Utc>,
    #[serde(default)]
    orphan: bool,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    ttl: u64,
    #[serde(default)]
    explicit_max_ttl: u64,
    #[serde(default)]
    num_uses: u64,
    #[serde(default)]
    period: u64,
    #[serde(default, rename = "type")]
    token_type: TokenType,
    #[serde(default)]
    expire_time: Option<DateTime<Utc>>,
    #[serde(default)]
    path: String,
    #[serde(default)]
    bound_cidrs: OneOrMany,
}

impl Token {
    /// A token known only by its id, e.g. one read from configuration
    /// before it has been validated.
    #[must_use]
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            accessor: String::new(),
            policies: BTreeSet::new(),
            identity_policies: BTreeSet::new(),
            renewable: false,
            entity_id: String::new(),
            metadata: BTreeMap::new(),
            creation_time: Utc::now(),
            orphan: false,
            display_name: String::new(),
            ttl: 0,
            explicit_max_ttl: 0,
            num_uses: 0,
            period: 0,
            token_type: TokenType::Service,
            expire_time: None,
            path: String::new(),
            bound_cidrs: OneOrMany::Absent,
        }
    }

    /// The secret token id sent as `X-Vault-Token`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Non-secret handle for this token.
    #[must_use]
    pub fn accessor(&self) -> &str {
        &self.accessor
    }

    /// Token policies.
    #[must_use]
    pub const fn policies(&self) -> &BTreeSet<String> {
        &self.policies
    }

    /// Policies inherited through the identity entity.
    #[must_use]
    pub const fn identity_policies(&self) -> &BTreeSet<String> {
        &self.identity_policies
    }

    /// Whether the TTL can be extended.
    #[must_use]
    pub const fn is_renewable(&self) -> bool {
        self.renewable
    }

    /// Identity entity the token belongs to, empty if none.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Free form metadata attached at creation.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// When the token was created.
    #[must_use]
    pub const fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    /// Display name given at creation.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Remaining TTL in seconds at the time of the last lookup.
    #[must_use]
    pub const fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Hard upper bound on the TTL, 0 when unset.
    #[must_use]
    pub const fn explicit_max_ttl(&self) -> u64 {
        self.explicit_max_ttl
    }

    /// Remaining uses, 0 for unlimited.
    #[must_use]
    pub const fn num_uses(&self) -> u64 {
        self.num_uses
    }

    /// Renewal period for periodic tokens, 0 otherwise.
    #[must_use]
    pub const fn period(&self) -> u64 {
        self.period
    }

    /// Service or batch.
    #[must_use]
    pub const fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Absolute expiry, `None` for tokens that never expire.
    #[must_use]
    pub const fn expire_time(&self) -> Option<DateTime<Utc>> {
        self.expire_time
    }

    /// Auth path that created the token.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// CIDR blocks the token is bound to.
    #[must_use]
    pub const fn bound_cidrs(&self) -> &OneOrMany {
        &self.bound_cidrs
    }

    /// Whether the token has no parent.
    #[must_use]
    pub const fn is_orphan(&self) -> bool {
        self.orphan
    }

    /// Complement of [`Token::is_orphan`].
    #[must_use]
    pub const fn has_parent(&self) -> bool {
        !self.orphan
    }

    /// Set the orphan bit; `has_parent` flips with it.
    pub fn set_orphan(&mut self, orphan: bool) {
        self.orphan = orphan;
    }

    /// Set the parent bit; `is_orphan` flips with it.
    pub fn set_has_parent(&mut self, has_parent: bool) {
        self.orphan = !has_parent;
    }

    /// Whether the token has passed its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_time.is_some_and(|t| t <= now)
    }

    /// Copy the mutable fields of a freshly read record into `self`.
    ///
    /// Id, accessor and creation time are kept from `self`.
    pub fn refresh_from(&mut self, fresh: Self) {
        self.policies = fresh.policies;
        self.identity_policies = fresh.identity_policies;
        self.renewable = fresh.renewable;
        self.entity_id = fresh.entity_id;
        self.metadata = fresh.metadata;
        self.orphan = fresh.orphan;
        self.display_name = fresh.display_name;
        self.ttl = fresh.ttl;
        self.explicit_max_ttl = fresh.explicit_max_ttl;
        self.num_uses = fresh.num_uses;
        self.period = fresh.period;
        self.token_type = fresh.token_type;
        self.expire_time = fresh.expire_time;
        self.path = fresh.path;
        self.bound_cidrs = fresh.bound_cidrs;
    }
}

impl From<&LoginResponse> for Token {
    fn from(login: &LoginResponse) -> Self {
        let mut token = Self::from_id(login.client_token.clone());
        token.accessor.clone_from(&login.accessor);
        token.policies = login.policies.iter().cloned().collect();
        token.identity_policies = login.identity_policies.iter().cloned().collect();
        token.renewable = login.renewable;
        token.entity_id.clone_from(&login.entity_id);
        token.metadata.clone_from(&login.metadata);
        token.ttl = login.lease_duration;
        token.orphan = login.orphan;
        token
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &"[REDACTED]")
            .field("accessor", &self.accessor)
            .field("policies", &self.policies)
            .field("identity_policies", &self.identity_policies)
            .field("renewable", &self.renewable)
            .field("entity_id", &self.entity_id)
            .field("display_name", &self.display_name)
            .field("orphan", &self.orphan)
            .field("ttl", &self.ttl)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lookup_data() -> serde_json::Value {
        json!({
            "accessor": "8609694a-cdbc-db9b-d345-e782dbb562ed",
            "creation_time": 1_523_979_354,
            "creation_ttl": 2_764_800,
            "display_name": "ldap2-tesla",
            "entity_id": "7d2e3179-f69b-450c-7179-ac8ee8bd8ca9",
            "expire_time": "2018-05-19T11:35:54.466476215-04:00",
            "explicit_max_ttl": 0,
            "id": "cf64a70f-3a12-3f6c-791d-6cef6d390eed",
            "identity_policies": ["dev-group-policy"],
            "issue_time": "2018-04-17T11:35:54.466476078-04:00",
            "meta": {"username": "tesla"},
            "num_uses": 0,
            "orphan": true,
            "path": "auth/ldap2/login/tesla",
            "policies": ["default", "testgroup2-policy"],
            "renewable": true,
            "ttl": 2_764_790,
            "type": "service"
        })
    }

    #[test]
    fn test_deserialize_lookup() {
        let token: Token = serde_json::from_value(lookup_data()).unwrap();
        assert_eq!(token.id(), "cf64a70f-3a12-3f6c-791d-6cef6d390eed");
        assert_eq!(token.accessor(), "8609694a-cdbc-db9b-d345-e782dbb562ed");
        assert!(token.policies().contains("testgroup2-policy"));
        assert!(token.identity_policies().contains("dev-group-policy"));
        assert_eq!(token.metadata().get("username").map(String::as_str), Some("tesla"));
        assert_eq!(token.creation_time().timestamp(), 1_523_979_354);
        assert!(token.is_orphan());
        assert!(!token.has_parent());
        assert_eq!(token.token_type(), TokenType::Service);
        assert!(token.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_null_collections_default() {
        let token: Token = serde_json::from_value(json!({
            "id": "abc",
            "meta": null,
            "policies": null,
            "type": "something-new"
        }))
        .unwrap();
        assert!(token.metadata().is_empty());
        assert!(token.policies().is_empty());
        assert_eq!(token.token_type(), TokenType::Unknown);
        assert!(token.expire_time().is_none());
        assert!(!token.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_orphan_parent_are_complements() {
        let mut token = Token::from_id("abc");
        assert!(token.has_parent());
        token.set_orphan(true);
        assert!(!token.has_parent());
        token.set_has_parent(true);
        assert!(!token.is_orphan());
        token.set_has_parent(false);
        assert!(token.is_orphan());
    }

    #[test]
    fn test_refresh_preserves_identity() {
        let mut token: Token = serde_json::from_value(lookup_data()).unwrap();
        let created = token.creation_time();

        let mut data = lookup_data();
        data["id"] = json!("other-id");
        data["accessor"] = json!("other-accessor");
        data["creation_time"] = json!(1);
        data["policies"] = json!(["default", "admin"]);
        data["ttl"] = json!(60);
        let fresh: Token = serde_json::from_value(data).unwrap();

        token.refresh_from(fresh);
        assert_eq!(token.id(), "cf64a70f-3a12-3f6c-791d-6cef6d390eed");
        assert_eq!(token.accessor(), "8609694a-cdbc-db9b-d345-e782dbb562ed");
        assert_eq!(token.creation_time(), created);
        assert!(token.policies().contains("admin"));
        assert_eq!(token.ttl(), 60);
    }

    #[test]
    fn test_debug_redacts_id() {
        let token = Token::from_id("s.super-secret");
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
