//! Registry of loaded role schemas.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{FieldCondition, FieldRef, RoleSchema, SchemaError, ThemeSummary};
use crate::domain::interview::progress::{calculate_progress, ProgressReport};
use crate::domain::interview::{FilledFields, Role};

/// Read-only lookup of schemas by role.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it
/// while interviews run.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    schemas: HashMap<Role, RoleSchema>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema, replacing any previous one for the same role.
    pub fn with_schema(mut self, schema: RoleSchema) -> Self {
        self.insert(schema);
        self
    }

    pub fn insert(&mut self, schema: RoleSchema) -> Option<RoleSchema> {
        self.schemas.insert(schema.role, schema)
    }

    /// Roles with a configured schema, in canonical order.
    pub fn roles(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.schemas.contains_key(role))
            .collect()
    }

    pub fn load(&self, role: Role) -> Result<&RoleSchema, SchemaError> {
        self.schemas.get(&role).ok_or(SchemaError::NotFound(role))
    }

    pub fn all_fields(&self, role: Role) -> Result<BTreeMap<&str, FieldRef<'_>>, SchemaError> {
        Ok(self.load(role)?.all_fields())
    }

    pub fn field(&self, role: Role, field_id: &str) -> Result<Option<FieldRef<'_>>, SchemaError> {
        Ok(self.load(role)?.field(field_id))
    }

    pub fn required_fields(&self, role: Role) -> Result<BTreeSet<&str>, SchemaError> {
        Ok(self.load(role)?.required_fields())
    }

    pub fn conditional_fields(
        &self,
        role: Role,
    ) -> Result<BTreeMap<&str, &FieldCondition>, SchemaError> {
        Ok(self.load(role)?.conditional_fields())
    }

    pub fn next_unfilled_field(
        &self,
        role: Role,
        filled: &FilledFields,
    ) -> Result<Option<FieldRef<'_>>, SchemaError> {
        Ok(self.load(role)?.next_unfilled_field(filled))
    }

    pub fn themes(&self, role: Role) -> Result<Vec<ThemeSummary>, SchemaError> {
        Ok(self.load(role)?.theme_summaries())
    }

    pub fn calculate_progress(
        &self,
        role: Role,
        filled: &FilledFields,
    ) -> Result<ProgressReport, SchemaError> {
        Ok(calculate_progress(self.load(role)?, filled))
    }
}
