use serde_json::Value;

/// Flattens a decoded claims set into the authority collection consumed by
/// the access-control checks.
///
/// Three claim families contribute, in order: the space-delimited `scope`
/// claim (`SCOPE_<s>`), `realm_access.roles` (`ROLE_<name>`), and
/// `authorization.permissions` expanded per resource scope
/// (`PERMISSION_<rsname>:<scope>`). A missing or mis-shaped family
/// contributes nothing; duplicates are kept. This function never fails.
pub fn flatten_authorities(claims: &Value) -> Vec<String> {
    let mut authorities = scope_authorities(claims);
    authorities.extend(role_authorities(claims));
    authorities.extend(permission_authorities(claims));
    authorities
}

fn scope_authorities(claims: &Value) -> Vec<String> {
    claims
        .get("scope")
        .and_then(Value::as_str)
        .map(|scope| {
            scope
                .split_whitespace()
                .map(|s| format!("SCOPE_{s}"))
                .collect()
        })
        .unwrap_or_default()
}

fn role_authorities(claims: &Value) -> Vec<String> {
    claims
        .get("realm_access")
        .and_then(|realm_access| realm_access.get("roles"))
        .and_then(Value::as_array)
        .map(|roles| {
            roles
                .iter()
                .filter_map(Value::as_str)
                .map(|role| format!("ROLE_{role}"))
                .collect()
        })
        .unwrap_or_default()
}

fn permission_authorities(claims: &Value) -> Vec<String> {
    let Some(permissions) = claims
        .get("authorization")
        .and_then(|authorization| authorization.get("permissions"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut authorities = Vec::new();
    for permission in permissions {
        let Some(resource_name) = permission.get("rsname").and_then(Value::as_str) else {
            continue;
        };
        let Some(scopes) = permission.get("scopes").and_then(Value::as_array) else {
            continue;
        };
        for scope in scopes.iter().filter_map(Value::as_str) {
            authorities.push(format!("PERMISSION_{resource_name}:{scope}"));
        }
    }
    authorities
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_three_families_flatten() {
        let claims = json!({
            "scope": "read write",
            "realm_access": {"roles": ["user", "admin"]},
            "authorization": {"permissions": [
                {"rsname": "product-api", "scopes": ["view", "edit"]},
                {"rsname": "order-api", "scopes": ["view"]}
            ]}
        });

        assert_eq!(
            flatten_authorities(&claims),
            vec![
                "SCOPE_read",
                "SCOPE_write",
                "ROLE_user",
                "ROLE_admin",
                "PERMISSION_product-api:view",
                "PERMISSION_product-api:edit",
                "PERMISSION_order-api:view",
            ]
        );
    }

    #[test]
    fn test_scope_only() {
        let claims = json!({
            "scope": "read",
            "realm_access": null,
            "authorization": null
        });
        assert_eq!(flatten_authorities(&claims), vec!["SCOPE_read"]);
    }

    #[test]
    fn test_realm_access_without_roles_key() {
        let claims = json!({"realm_access": {"some_other_key": "x"}});
        assert!(flatten_authorities(&claims).is_empty());
    }

    #[test]
    fn test_authorization_without_permissions_key() {
        let claims = json!({"authorization": {"some_other_key": "x"}});
        assert!(flatten_authorities(&claims).is_empty());
    }

    #[test]
    fn test_missing_claims_contribute_nothing() {
        assert!(flatten_authorities(&json!({})).is_empty());
    }

    #[test]
    fn test_mis_shaped_families_contribute_nothing() {
        let claims = json!({
            "scope": 42,
            "realm_access": {"roles": "not-a-list"},
            "authorization": {"permissions": [
                {"scopes": ["view"]},
                {"rsname": "order-api", "scopes": "not-a-list"},
                {"rsname": "patient", "scopes": ["read"]}
            ]}
        });
        // Only the well-formed record survives.
        assert_eq!(flatten_authorities(&claims), vec!["PERMISSION_patient:read"]);
    }

    #[test]
    fn test_resource_with_empty_scopes_contributes_nothing() {
        let claims = json!({
            "authorization": {"permissions": [{"rsname": "patient", "scopes": []}]}
        });
        assert!(flatten_authorities(&claims).is_empty());
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let claims = json!({
            "realm_access": {"roles": ["user", "user"]}
        });
        assert_eq!(flatten_authorities(&claims), vec!["ROLE_user", "ROLE_user"]);
    }

    #[test]
    fn test_same_claims_flatten_identically() {
        let claims = json!({
            "scope": "read",
            "realm_access": {"roles": ["user"]},
            "authorization": {"permissions": [{"rsname": "patient", "scopes": ["read"]}]}
        });
        assert_eq!(flatten_authorities(&claims), flatten_authorities(&claims));
    }
}
