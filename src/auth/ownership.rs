//! Resource ownership checks for resource-scoped routes
//!
//! Handlers that address a todo by id call [`authorize_owner`] with the
//! authenticated [`Principal`] before touching the resource. A missing
//! resource is reported as 404 and a resource owned by someone else as 403.

use async_trait::async_trait;

use super::claims::Principal;
use super::error::AuthorizationError;

/// Source of ownership facts, implemented by the persistence layer
#[async_trait]
pub trait OwnershipLookup: Send + Sync {
    /// Owner of `resource_id`, or `None` when the resource does not exist
    async fn owner_of(&self, resource_id: &str) -> crate::Result<Option<Principal>>;
}

/// Require that `principal` owns `resource_id`
pub async fn authorize_owner<L>(
    principal: &Principal,
    lookup: &L,
    resource_id: &str,
) -> Result<(), AuthorizationError>
where
    L: OwnershipLookup + ?Sized,
{
    let owner = lookup.owner_of(resource_id).await.map_err(|e| {
        tracing::error!(resource_id, "Ownership lookup failed: {}", e);
        AuthorizationError::Lookup(e.to_string())
    })?;

    match owner {
        None => {
            tracing::debug!(resource_id, "Resource not found");
            Err(AuthorizationError::NotFound)
        }
        Some(owner) if owner == *principal => Ok(()),
        Some(owner) => {
            tracing::warn!(
                resource_id,
                principal = %principal,
                owner = %owner,
                "Principal does not own resource"
            );
            Err(AuthorizationError::Forbidden)
        }
    }
}
