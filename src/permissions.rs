//! Role capability tiers.
//!
//! Two tiers gate catalog mutations: the editor tier (labels, groups,
//! artists) and the content tier (cards and eras). Evaluation is pure and
//! fails closed on an empty role set.

use crate::database::models::{Role, RoleRecord};

/// True when the role set may create or edit labels, groups and artists.
pub fn is_editor_tier(roles: &[Role]) -> bool {
    const VALID: [Role; 3] = [Role::Administrator, Role::Sentinel, Role::Paladin];
    roles.iter().any(|role| VALID.contains(role))
}

/// True when the role set may create or edit cards and eras.
pub fn is_content_tier(roles: &[Role]) -> bool {
    const VALID: [Role; 2] = [Role::Administrator, Role::Sentinel];
    roles.iter().any(|role| VALID.contains(role))
}

/// Static role catalog rows, seeded once via `beeno seed`.
pub fn role_catalog() -> Vec<RoleRecord> {
    vec![
        RoleRecord {
            role: Role::Administrator,
            title: "Administrator".to_string(),
            description: "Has all permissions, can grant other users roles.".to_string(),
            color_code: "003049".to_string(),
        },
        RoleRecord {
            role: Role::Sentinel,
            title: "Sentinel".to_string(),
            description: "Can Edit & Create Cards and Eras".to_string(),
            color_code: "d62828".to_string(),
        },
        RoleRecord {
            role: Role::Paladin,
            title: "Paladin".to_string(),
            description: "Can Create & Edit Companies, Groups & Artists".to_string(),
            color_code: "e29578".to_string(),
        },
    ]
}
