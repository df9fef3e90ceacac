//! Multi-Tenant Traits
//!
//! Every record that belongs to a linked user implements [`TenantAware`].
//! [`TenantAware::ensure_tenant`] is the last check before a stored record
//! is handed back to a caller.
//!
//! # Example
//!
//! ```
//! use unison_core::{TenantAware, TenantId};
//!
//! struct Note {
//!     tenant_id: TenantId,
//! }
//!
//! impl TenantAware for Note {
//!     fn tenant_id(&self) -> TenantId {
//!         self.tenant_id
//!     }
//! }
//!
//! let tenant = TenantId::new();
//! let note = Note { tenant_id: tenant };
//! assert!(note.ensure_tenant(tenant).is_ok());
//! assert!(note.ensure_tenant(TenantId::new()).is_err());
//! ```

use crate::error::{Result, UnisonError};
use crate::ids::TenantId;

/// Trait for entities that belong to a specific tenant.
///
/// This trait is object-safe.
pub trait TenantAware {
    /// Returns the tenant ID this entity belongs to.
    fn tenant_id(&self) -> TenantId;

    /// Fails with [`UnisonError::TenantMismatch`] unless the entity belongs
    /// to `expected`.
    fn ensure_tenant(&self, expected: TenantId) -> Result<()> {
        let actual = self.tenant_id();
        if actual == expected {
            Ok(())
        } else {
            Err(UnisonError::TenantMismatch { expected, actual })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Record {
        tenant_id: TenantId,
    }

    impl TenantAware for Record {
        fn tenant_id(&self) -> TenantId {
            self.tenant_id
        }
    }

    #[test]
    fn test_ensure_tenant_accepts_owner() {
        let tenant = TenantId::new();
        let record = Record { tenant_id: tenant };
        assert!(record.ensure_tenant(tenant).is_ok());
    }

    #[test]
    fn test_ensure_tenant_rejects_other_tenant() {
        let owner = TenantId::new();
        let other = TenantId::new();
        let record = Record { tenant_id: owner };

        match record.ensure_tenant(other) {
            Err(UnisonError::TenantMismatch { expected, actual }) => {
                assert_eq!(expected, other);
                assert_eq!(actual, owner);
            }
            other => panic!("expected tenant mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_trait_object() {
        let tenant = TenantId::new();
        let record: Box<dyn TenantAware> = Box::new(Record { tenant_id: tenant });
        assert_eq!(record.tenant_id(), tenant);
    }
}
