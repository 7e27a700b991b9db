//! Entity type registry
//!
//! Maps dotted type names (as written in the `type` attribute of a selection
//! list) to factories producing initialized entities. The host populates it
//! at start-up; codecs only look names up.

use crate::entity::Entity;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Factory producing a freshly initialized entity
pub type EntityFactory = Arc<dyn Fn() -> Entity + Send + Sync>;

/// Registry for late-bound entity construction
#[derive(Clone, Default)]
pub struct EntityRegistry {
    factories: HashMap<String, EntityFactory>,
    permissive: bool,
}

impl EntityRegistry {
    /// Create an empty, strict registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that builds a generic [`Entity`] for unregistered names
    pub fn permissive() -> Self {
        Self {
            factories: HashMap::new(),
            permissive: true,
        }
    }

    /// Register a factory for a type name
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        factory: impl Fn() -> Entity + Send + Sync + 'static,
    ) -> &mut Self {
        let type_name = type_name.into();
        debug!(type_name = %type_name, "Registered entity factory");
        self.factories.insert(type_name, Arc::new(factory));
        self
    }

    /// Register a prototype; each construction yields its initialized copy
    pub fn register_prototype(&mut self, prototype: Entity) -> &mut Self {
        let type_name = prototype.type_name.clone();
        self.register(type_name, move || prototype.initialized_copy())
    }

    /// Construct an entity by type name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEntityType`] when no factory is registered and
    /// the registry is not permissive.
    pub fn create(&self, type_name: &str) -> Result<Entity> {
        match self.factories.get(type_name) {
            Some(factory) => {
                let mut entity = factory();
                entity.type_name = type_name.to_string();
                trace!(type_name, "Constructed registered entity");
                Ok(entity)
            }
            None if self.permissive => {
                trace!(type_name, "Constructed generic entity");
                Ok(Entity::new(type_name))
            }
            None => Err(Error::unknown_entity_type(type_name)),
        }
    }

    /// Check if a type name is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("types", &self.type_names())
            .field("permissive", &self.permissive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SubTable;

    #[test]
    fn test_register_and_create() {
        let mut registry = EntityRegistry::new();
        registry.register("afp.billing.Invoice", || {
            Entity::new("ignored").with_default_table("Lines")
        });

        let entity = registry.create("afp.billing.Invoice").unwrap();
        assert_eq!(entity.type_name, "afp.billing.Invoice");
        assert_eq!(entity.default_table, "Lines");
        assert!(registry.contains("afp.billing.Invoice"));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let registry = EntityRegistry::new();
        let err = registry.create("Nope").unwrap_err();
        assert!(matches!(err, Error::UnknownEntityType { ref type_name } if type_name == "Nope"));
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn test_permissive_registry_builds_generic_entities() {
        let registry = EntityRegistry::permissive();
        let entity = registry.create("Anything").unwrap();
        assert_eq!(entity.type_name, "Anything");
        assert!(entity.tables.is_empty());
    }

    #[test]
    fn test_prototype_yields_fresh_copies() {
        let mut prototype = Entity::new("Customer").with_table(SubTable::with_fields(
            "Main",
            ["Name", "City"],
        ));
        prototype
            .primary_table_mut()
            .append_record([("Name", Some("Ann".into()))]);

        let mut registry = EntityRegistry::new();
        registry.register_prototype(prototype);

        let created = registry.create("Customer").unwrap();
        let main = created.primary_table().unwrap();
        assert_eq!(main.fields, vec!["Name", "City"]);
        assert!(main.is_empty());
    }

    #[test]
    fn test_type_names_sorted() {
        let mut registry = EntityRegistry::new();
        registry
            .register("b.Two", || Entity::new("b.Two"))
            .register("a.One", || Entity::new("a.One"));
        assert_eq!(registry.type_names(), vec!["a.One", "b.Two"]);
    }
}
