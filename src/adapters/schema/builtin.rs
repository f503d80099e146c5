//! Schemas compiled into the binary.

use crate::domain::interview::schema::{RoleSchema, SchemaError, SchemaStore};

const BUILTIN: [(&str, &str); 3] = [
    ("builtin:role_schema_it.yaml", include_str!("../../../schemas/role_schema_it.yaml")),
    (
        "builtin:role_schema_business.yaml",
        include_str!("../../../schemas/role_schema_business.yaml"),
    ),
    (
        "builtin:role_schema_management.yaml",
        include_str!("../../../schemas/role_schema_management.yaml"),
    ),
];

/// Store holding the default schema of every role.
pub fn builtin_schemas() -> Result<SchemaStore, SchemaError> {
    BUILTIN
        .iter()
        .try_fold(SchemaStore::new(), |store, (source, text)| {
            Ok(store.with_schema(RoleSchema::from_yaml(text, source)?))
        })
}
