//! Attribute registry service.
//!
//! Custom fields are registered on base kinds, so an engagement call and an
//! engagement meeting share the fields defined on `engagement`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use unison_connector::{CustomFieldMapping, ProviderRegistry, TenantContext};
use unison_core::{AttributeId, FieldViolation, ObjectId, ObjectKind, Provider, TenantId};
use unison_db::{Attribute, AttributeValue, DbError, Entity, NewAttribute, Store};
use validator::Validate;

use crate::error::{FieldMappingError, FieldMappingResult};
use crate::models::{CustomProperty, DefineTargetField, MapFieldToProvider};

/// Custom field values keyed by slug.
pub type SlugValues = BTreeMap<String, Value>;

/// Defines custom fields, maps them onto provider properties and resolves
/// their values.
#[derive(Clone)]
pub struct FieldMappingService {
    store: Arc<dyn Store>,
    registry: Arc<ProviderRegistry>,
}

impl std::fmt::Debug for FieldMappingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMappingService")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl FieldMappingService {
    /// Create a new FieldMappingService.
    pub fn new(store: Arc<dyn Store>, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    /// Define a new custom field.
    ///
    /// # Errors
    ///
    /// `DuplicateSlug` when the slug already exists for the tenant and kind.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id, slug = %request.slug))]
    pub async fn define_target_field(
        &self,
        tenant_id: TenantId,
        request: DefineTargetField,
    ) -> FieldMappingResult<Attribute> {
        request.validate()?;
        let kind = request.object_kind.base();

        let attribute = self
            .store
            .insert_attribute(NewAttribute {
                tenant_id,
                object_kind: kind,
                slug: request.slug.clone(),
                data_type: request.data_type,
            })
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => FieldMappingError::duplicate_slug(&request.slug, kind),
                other => other.into(),
            })?;

        info!(attribute_id = %attribute.id, object_kind = %kind, "Custom field defined");
        Ok(attribute)
    }

    /// Map a custom field onto a provider property, replacing any previous
    /// remote key for that provider.
    ///
    /// # Errors
    ///
    /// `UnknownAttribute` when the slug does not exist for the tenant and kind.
    #[instrument(skip(self, request), fields(tenant_id = %tenant_id, slug = %request.slug, provider = %request.provider))]
    pub async fn map_field_to_provider(
        &self,
        tenant_id: TenantId,
        request: MapFieldToProvider,
    ) -> FieldMappingResult<Attribute> {
        request.validate()?;
        let kind = request.object_kind.base();

        let attribute = self
            .store
            .find_attribute(tenant_id, kind, &request.slug)
            .await?
            .ok_or_else(|| FieldMappingError::unknown_attribute(&request.slug, kind))?;

        let attribute = self
            .store
            .set_remote_key(tenant_id, attribute.id, request.provider, &request.remote_key)
            .await?;

        info!(attribute_id = %attribute.id, remote_key = %request.remote_key, "Custom field mapped");
        Ok(attribute)
    }

    /// Custom field values of one object by slug; empty when none are set.
    pub async fn resolve_values_for_object(
        &self,
        tenant_id: TenantId,
        owner_id: ObjectId,
    ) -> FieldMappingResult<SlugValues> {
        Ok(self.store.values_for_owner(tenant_id, owner_id).await?)
    }

    /// [`Self::resolve_values_for_object`] for several objects in one lookup.
    pub async fn resolve_values_for_objects(
        &self,
        tenant_id: TenantId,
        owner_ids: &[ObjectId],
    ) -> FieldMappingResult<HashMap<ObjectId, SlugValues>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self.store.values_for_owners(tenant_id, owner_ids).await?)
    }

    /// The tenant's custom fields on `kind` that have a remote key for
    /// `provider`.
    pub async fn custom_mappings(
        &self,
        tenant_id: TenantId,
        kind: ObjectKind,
        provider: Provider,
    ) -> FieldMappingResult<Vec<CustomFieldMapping>> {
        let attributes = self.store.list_attributes(tenant_id, Some(kind.base())).await?;
        Ok(attributes
            .iter()
            .filter_map(|a| {
                a.remote_key(provider)
                    .map(|key| CustomFieldMapping::new(a.slug.clone(), key))
            })
            .collect())
    }

    /// Check submitted values against the tenant's custom fields on `kind`.
    ///
    /// Returns one violation per unknown slug or mistyped value.
    pub async fn check_values(
        &self,
        tenant_id: TenantId,
        kind: ObjectKind,
        values: &SlugValues,
    ) -> FieldMappingResult<Vec<FieldViolation>> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let attributes = self.attributes_by_slug(tenant_id, kind).await?;
        Ok(values
            .iter()
            .filter(|(_, value)| !value.is_null())
            .filter_map(|(slug, value)| {
                let field = format!("field_mappings.{slug}");
                match attributes.get(slug.as_str()) {
                    None => Some(FieldViolation::new(field, "unknown custom field")),
                    Some(a) if !a.data_type.accepts(value) => {
                        Some(FieldViolation::new(field, format!("expected a {} value", a.data_type)))
                    }
                    Some(_) => None,
                }
            })
            .collect())
    }

    /// Upsert custom field values on `owner_id`.
    ///
    /// Values for unknown slugs or of the wrong type are skipped and logged;
    /// they come from provider payloads and never fail a sync. Returns the
    /// number of values stored.
    #[instrument(skip(self, values), fields(tenant_id = %tenant_id, owner_id = %owner_id))]
    pub async fn store_values(
        &self,
        tenant_id: TenantId,
        owner_id: ObjectId,
        owner_kind: ObjectKind,
        values: &SlugValues,
    ) -> FieldMappingResult<usize> {
        if values.is_empty() {
            return Ok(0);
        }
        let attributes = self.attributes_by_slug(tenant_id, owner_kind).await?;

        let mut stored = 0;
        for (slug, value) in values {
            if value.is_null() {
                continue;
            }
            let Some(attribute) = attributes.get(slug.as_str()) else {
                debug!(slug = %slug, "Skipping value for unknown custom field");
                continue;
            };
            if !attribute.data_type.accepts(value) {
                warn!(
                    slug = %slug,
                    data_type = %attribute.data_type,
                    "Skipping custom field value of the wrong type"
                );
                continue;
            }
            self.store
                .upsert_value(tenant_id, attribute.id, owner_id, owner_kind, value.clone())
                .await?;
            stored += 1;
        }
        Ok(stored)
    }

    pub async fn list_entities(&self, tenant_id: TenantId) -> FieldMappingResult<Vec<Entity>> {
        Ok(self.store.list_entities(tenant_id).await?)
    }

    /// Custom fields of the tenant, optionally on one kind.
    pub async fn list_attributes(
        &self,
        tenant_id: TenantId,
        kind: Option<ObjectKind>,
    ) -> FieldMappingResult<Vec<Attribute>> {
        Ok(self
            .store
            .list_attributes(tenant_id, kind.map(|k| k.base()))
            .await?)
    }

    pub async fn list_values(
        &self,
        tenant_id: TenantId,
        attribute_id: Option<AttributeId>,
    ) -> FieldMappingResult<Vec<AttributeValue>> {
        Ok(self.store.list_values(tenant_id, attribute_id).await?)
    }

    /// Properties the provider exposes on `kind`, each annotated with the
    /// custom field already mapped onto it.
    #[instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id, provider = %provider))]
    pub async fn get_custom_properties(
        &self,
        ctx: &TenantContext,
        provider: Provider,
        kind: ObjectKind,
    ) -> FieldMappingResult<Vec<CustomProperty>> {
        let adapter = self.registry.get_adapter(provider)?;
        let properties = adapter.custom_properties(kind, ctx).await?;

        let mapped: HashMap<String, String> = self
            .custom_mappings(ctx.tenant_id, kind, provider)
            .await?
            .into_iter()
            .map(|m| (m.remote_key, m.slug))
            .collect();

        Ok(properties
            .into_iter()
            .map(|property| CustomProperty {
                mapped_slug: mapped.get(&property.name).cloned(),
                property,
            })
            .collect())
    }

    async fn attributes_by_slug(
        &self,
        tenant_id: TenantId,
        kind: ObjectKind,
    ) -> FieldMappingResult<HashMap<String, Attribute>> {
        Ok(self
            .store
            .list_attributes(tenant_id, Some(kind.base()))
            .await?
            .into_iter()
            .map(|a| (a.slug.clone(), a))
            .collect())
    }
}
