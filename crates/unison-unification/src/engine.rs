//! Desunify and unify.
//!
//! The engine holds no provider knowledge. It resolves the mapper for the
//! (provider, kind) pair, applies it, and layers tenant custom fields on
//! top using the mapper's custom-field container.

use serde_json::Value;
use tracing::{debug, error};
use unison_connector::{mapper_for, CustomFieldMapping, FieldMap, ObjectMapper};
use unison_core::{ObjectKind, Provider};

use crate::error::{UnificationError, UnificationResult};
use crate::resource::UnifiedResource;
use crate::unified::{Desunified, FieldMappings, OneOrMany, Unified, UnifiedInput};

/// Stateless converter between canonical resources and provider payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnificationEngine;

impl UnificationEngine {
    /// Create a new engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Kind a resource will be created and stored as.
    pub fn route<R: UnifiedResource>(&self, resource: &R) -> UnificationResult<ObjectKind> {
        Ok(resource.sub_kind()?)
    }

    /// Convert a canonical input into the payload `provider` expects.
    pub fn desunify<R: UnifiedResource>(
        &self,
        input: &UnifiedInput<R>,
        provider: Provider,
        custom_mappings: &[CustomFieldMapping],
    ) -> UnificationResult<Desunified> {
        let kind = self.route(&input.resource)?;
        let fields = input
            .resource
            .to_fields()
            .map_err(|e| UnificationError::mapping(provider, kind, None, e.to_string()))?;
        self.desunify_fields(&fields, &input.field_mappings, kind, provider, custom_mappings)
    }

    /// Lower-level desunify over an already-routed field map.
    ///
    /// Custom field values without a mapping for `provider` are left out of
    /// the payload.
    pub fn desunify_fields(
        &self,
        fields: &FieldMap,
        field_mappings: &FieldMappings,
        kind: ObjectKind,
        provider: Provider,
        custom_mappings: &[CustomFieldMapping],
    ) -> UnificationResult<Desunified> {
        let mapper = mapper_for(provider, kind)?;
        let mut payload = mapper.to_remote(fields, kind).map_err(|e| {
            error!(provider = %provider, object_kind = %kind, error = %e, "Desunify failed");
            UnificationError::from(e)
        })?;

        for (slug, value) in field_mappings {
            match custom_mappings.iter().find(|m| &m.slug == slug) {
                Some(mapping) if !value.is_null() => {
                    write_custom(mapper, &mut payload, &mapping.remote_key, value.clone());
                }
                Some(_) => {}
                None => {
                    debug!(provider = %provider, slug = %slug, "No remote key for custom field");
                }
            }
        }

        Ok(Desunified { kind, payload })
    }

    /// Convert provider payloads into canonical resources.
    ///
    /// `kind` is the routed kind the payloads were created as. A sequence is
    /// mapped element-wise and in order; any failing element fails the
    /// whole call.
    pub fn unify<R: UnifiedResource>(
        &self,
        remote: OneOrMany<Value>,
        kind: ObjectKind,
        provider: Provider,
        custom_mappings: &[CustomFieldMapping],
    ) -> UnificationResult<OneOrMany<Unified<R>>> {
        if !R::KIND.includes(kind) {
            return Err(UnificationError::mapping(
                provider,
                kind,
                None,
                format!("kind {kind} is not a {} kind", R::KIND),
            ));
        }
        let mapper = mapper_for(provider, kind)?;
        let indexed = matches!(remote, OneOrMany::Many(_));

        remote.try_map(|i, value| {
            let index = indexed.then_some(i);
            self.unify_one(mapper, &value, kind, custom_mappings)
                .map_err(|e| {
                    let e = match e {
                        UnifyFault::Connector(e) => UnificationError::from_connector(e, index),
                        UnifyFault::Shape(message) => {
                            UnificationError::mapping(provider, kind, index, message)
                        }
                    };
                    error!(
                        provider = %provider,
                        object_kind = %kind,
                        index = i,
                        error = %e,
                        "Unify failed"
                    );
                    e
                })
        })
    }

    fn unify_one<R: UnifiedResource>(
        &self,
        mapper: &dyn ObjectMapper,
        value: &Value,
        kind: ObjectKind,
        custom_mappings: &[CustomFieldMapping],
    ) -> Result<Unified<R>, UnifyFault> {
        let fields = mapper.from_remote(value, kind).map_err(UnifyFault::Connector)?;
        let resource = R::from_fields(fields).map_err(|e| UnifyFault::Shape(e.to_string()))?;

        let field_mappings = custom_mappings
            .iter()
            .filter_map(|m| {
                read_custom(mapper, value, &m.remote_key).map(|v| (m.slug.clone(), v.clone()))
            })
            .collect();

        Ok(Unified {
            remote_id: mapper.remote_id(value),
            resource,
            field_mappings,
        })
    }
}

enum UnifyFault {
    Connector(unison_connector::ConnectorError),
    Shape(String),
}

fn write_custom(mapper: &dyn ObjectMapper, payload: &mut Value, remote_key: &str, value: Value) {
    let record = mapper.record_mut(payload);
    if !record.is_object() {
        return;
    }
    let target = match mapper.custom_field_container() {
        Some(container) => {
            if !record.get(container).is_some_and(Value::is_object) {
                record[container] = Value::Object(FieldMap::new());
            }
            &mut record[container]
        }
        None => record,
    };
    if let Value::Object(map) = target {
        map.insert(remote_key.to_string(), value);
    }
}

fn read_custom<'a>(mapper: &dyn ObjectMapper, payload: &'a Value, remote_key: &str) -> Option<&'a Value> {
    let record = mapper.record(payload);
    mapper
        .custom_field_container()
        .and_then(|container| record.get(container))
        .and_then(|container| container.get(remote_key))
        .or_else(|| record.get(remote_key))
        .filter(|v| !v.is_null())
}
