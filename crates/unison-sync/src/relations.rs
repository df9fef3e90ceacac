//! Relation ids between canonical and remote form.
//!
//! Callers reference other objects by canonical id; providers know them by
//! their own remote id. Outbound ids are checked and swapped for the target
//! provider's ids, inbound ids are swapped back. An id with no counterpart
//! for the provider is dropped.

use std::collections::HashMap;

use futures::future::join_all;
use serde_json::Value;
use tracing::debug;
use unison_connector::FieldMap;
use unison_core::{FieldViolation, ObjectId, Provider, TenantId};
use unison_db::{CanonicalObject, DbResult, ObjectStore};
use unison_unification::{Reference, Relation};

/// Referenced objects, by canonical id.
pub type ResolvedReferences = HashMap<ObjectId, CanonicalObject>;

/// Load every referenced object, awaiting all lookups before returning.
///
/// Returns a violation for each id that does not name an object of the
/// relation's kind in the tenant. Ids that are not well-formed are left to
/// the resource's own validation.
pub async fn resolve_references<S: ObjectStore + ?Sized>(
    store: &S,
    tenant_id: TenantId,
    references: &[Reference],
) -> DbResult<(ResolvedReferences, Vec<FieldViolation>)> {
    let parsed: Vec<(&Reference, ObjectId)> = references
        .iter()
        .filter_map(|r| r.id.parse::<ObjectId>().ok().map(|id| (r, id)))
        .collect();

    let lookups = join_all(parsed.iter().map(|(_, id)| store.find_object(tenant_id, *id))).await;

    let mut resolved = ResolvedReferences::new();
    let mut violations = Vec::new();
    for ((reference, id), found) in parsed.into_iter().zip(lookups) {
        match found? {
            Some(object) if reference.relation.kind.includes(object.object_kind) => {
                resolved.insert(id, object);
            }
            _ => violations.push(FieldViolation::new(
                reference.relation.field,
                format!("no {} with id {id}", reference.relation.kind),
            )),
        }
    }
    Ok((resolved, violations))
}

/// Replace canonical relation ids in `fields` with `provider`'s remote ids.
pub fn to_remote_ids(
    fields: &mut FieldMap,
    relations: &[Relation],
    resolved: &ResolvedReferences,
    provider: Provider,
) {
    for relation in relations {
        rewrite(fields, relation, |id| {
            let remote = id
                .parse::<ObjectId>()
                .ok()
                .and_then(|id| resolved.get(&id))
                .filter(|object| object.provider == provider)
                .map(|object| object.remote_id.clone());
            if remote.is_none() {
                debug!(
                    field = relation.field,
                    id = %id,
                    provider = %provider,
                    "Relation has no remote id for provider, dropped"
                );
            }
            remote
        });
    }
}

/// Replace remote relation ids in `fields` with canonical ids.
pub async fn to_canonical_ids<S: ObjectStore + ?Sized>(
    store: &S,
    tenant_id: TenantId,
    provider: Provider,
    relations: &[Relation],
    fields: &mut FieldMap,
) -> DbResult<()> {
    for relation in relations {
        let remote_ids = ids_in(fields.get(relation.field));
        if remote_ids.is_empty() {
            continue;
        }

        let kinds = relation.kind.family();
        let lookups = join_all(
            remote_ids
                .iter()
                .map(|rid| store.find_by_remote(tenant_id, kinds, provider, rid)),
        )
        .await;

        let mut canonical = HashMap::new();
        for (rid, found) in remote_ids.iter().zip(lookups) {
            if let Some(object) = found? {
                canonical.insert(rid.clone(), object.id.to_string());
            }
        }

        rewrite(fields, relation, |rid| {
            let id = canonical.get(rid).cloned();
            if id.is_none() {
                debug!(
                    field = relation.field,
                    remote_id = %rid,
                    provider = %provider,
                    "Remote relation not synced yet, dropped"
                );
            }
            id
        });
    }
    Ok(())
}

fn ids_in(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(id)) => vec![id.clone()],
        Some(Value::Array(ids)) => ids.iter().filter_map(|id| id.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

/// Map every id of one relation field, removing ids `f` drops.
fn rewrite(fields: &mut FieldMap, relation: &Relation, mut f: impl FnMut(&str) -> Option<String>) {
    let ids = ids_in(fields.get(relation.field));
    if ids.is_empty() {
        return;
    }
    if relation.many {
        let mapped: Vec<Value> = ids.iter().filter_map(|id| f(id.as_str())).map(Value::String).collect();
        fields.insert(relation.field.to_string(), Value::Array(mapped));
    } else {
        match ids.first().and_then(|id| f(id.as_str())) {
            Some(id) => {
                fields.insert(relation.field.to_string(), Value::String(id));
            }
            None => {
                fields.remove(relation.field);
            }
        }
    }
}
