//! Registry of resources and entities, validated once and shared read-only.

use crate::error::ConfigError;
use crate::model::EntityModel;
use crate::resource::descriptor::ResourceDescriptor;
use crate::resource::validator::validate;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Registry {
    resources: Vec<ResourceDescriptor>,
    resource_by_slug: HashMap<String, usize>,
    entity_by_table: HashMap<String, EntityModel>,
}

impl Registry {
    /// Build from entity models and resource descriptors (validates first).
    pub fn build(entities: Vec<EntityModel>, resources: Vec<ResourceDescriptor>) -> Result<Self, ConfigError> {
        validate(&entities, &resources)?;
        let resource_by_slug = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.slug.clone(), i))
            .collect();
        let entity_by_table = entities
            .into_iter()
            .map(|e| (e.table_name.clone(), e))
            .collect();
        Ok(Self {
            resources,
            resource_by_slug,
            entity_by_table,
        })
    }

    pub fn resource(&self, slug: &str) -> Option<&ResourceDescriptor> {
        self.resource_by_slug.get(slug).and_then(|i| self.resources.get(*i))
    }

    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    pub fn entity(&self, table: &str) -> Option<&EntityModel> {
        self.entity_by_table.get(table)
    }

    /// Resource and its entity model; both exist once `build` succeeded.
    pub fn resolve(&self, slug: &str) -> Option<(&ResourceDescriptor, &EntityModel)> {
        let resource = self.resource(slug)?;
        let entity = self.entity(&resource.entity)?;
        Some((resource, entity))
    }
}
