//! JSON bodies shaped like Vault responses.

use chrono::Utc;
use serde_json::{Value, json};

/// Accessor used by [`token_lookup_body`] unless overridden.
pub const DEFAULT_ACCESSOR: &str = "8609694a-cdbc-db9b-d345-e782dbb562ed";

/// Body of `GET auth/token/lookup-self` for `id`.
#[must_use]
pub fn token_lookup_body(id: &str, accessor: &str, policies: &[&str]) -> Value {
    json!({
        "request_id": "2c6b3d4e-0000-4000-8000-000000000001",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": {
            "accessor": accessor,
            "creation_time": Utc::now().timestamp(),
            "creation_ttl": 2_764_800,
            "display_name": "token",
            "entity_id": "",
            "expire_time": null,
            "explicit_max_ttl": 0,
            "id": id,
            "identity_policies": null,
            "meta": null,
            "num_uses": 0,
            "orphan": false,
            "path": "auth/token/create",
            "policies": policies,
            "renewable": true,
            "ttl": 2_764_790,
            "type": "service"
        },
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Body of a successful `auth/<mount>/login` call.
#[must_use]
pub fn login_body(client_token: &str, accessor: &str, policies: &[&str]) -> Value {
    json!({
        "request_id": "2c6b3d4e-0000-4000-8000-000000000002",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": null,
        "warnings": null,
        "auth": {
            "client_token": client_token,
            "accessor": accessor,
            "policies": policies,
            "token_policies": policies,
            "identity_policies": ["identity-reader"],
            "metadata": {"role_name": "app"},
            "lease_duration": 3600,
            "renewable": true,
            "entity_id": "7d2e3179-f69b-450c-7179-ac8ee8bd8ca9",
            "token_type": "service",
            "orphan": true
        }
    })
}

/// Body of a `list=true` call.
#[must_use]
pub fn list_body(keys: &[&str]) -> Value {
    json!({
        "data": { "keys": keys },
        "warnings": null
    })
}

/// Body of any non-2xx response.
#[must_use]
pub fn error_body(errors: &[&str]) -> Value {
    json!({ "errors": errors })
}

/// A body with a warning attached.
#[must_use]
pub fn data_with_warning(data: Value, warning: &str) -> Value {
    json!({
        "data": data,
        "warnings": [warning]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_fixture_shape() {
        let body = token_lookup_body("hvs.abc", DEFAULT_ACCESSOR, &["default"]);
        assert_eq!(body["data"]["id"], "hvs.abc");
        assert_eq!(body["data"]["policies"][0], "default");
    }

    #[test]
    fn test_login_fixture_shape() {
        let body = login_body("hvs.issued", "acc", &["app"]);
        assert_eq!(body["auth"]["client_token"], "hvs.issued");
        assert!(body["data"].is_null());
    }
}
