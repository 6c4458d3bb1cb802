// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership checks for stored documents.
//!
//! Every mutation of a character or ability passes through
//! [`OwnershipEnforcer::verify_ownership`]. Reads use [`OwnershipCheck`] on
//! the lookup result, which folds "missing" and "not yours" into the same
//! outcome so a caller cannot probe for ids it does not own.

use crate::auth::AuthenticatedUser;
use crate::models::OwnerSet;

/// Trait for resources that carry an owner set.
pub trait OwnedResource {
    fn owners(&self) -> &OwnerSet;
}

/// Why an ownership check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipError {
    #[error("resource not found")]
    NotFound,
    #[error("user {user_id} is not an owner")]
    NotOwner { user_id: String },
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the user is one of the resource's owners.
    ///
    /// # Errors
    /// Returns `OwnershipError::NotOwner` if the user is not in the owner set.
    /// An empty owner set never matches.
    fn verify_ownership(&self, user: &AuthenticatedUser) -> Result<(), OwnershipError>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, user: &AuthenticatedUser) -> Result<(), OwnershipError> {
        if self.owners().contains(&user.user_id) {
            Ok(())
        } else {
            Err(OwnershipError::NotOwner {
                user_id: user.user_id.clone(),
            })
        }
    }
}

/// Ownership verification on a lookup result, for reads.
pub trait OwnershipCheck<T> {
    /// Return the resource if it exists and the user owns it.
    ///
    /// A resource owned by someone else reports `NotFound`.
    fn visible_to(self, user: &AuthenticatedUser) -> Result<T, OwnershipError>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn visible_to(self, user: &AuthenticatedUser) -> Result<T, OwnershipError> {
        match self {
            Some(resource) if resource.verify_ownership(user).is_ok() => Ok(resource),
            _ => Err(OwnershipError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owners: OwnerSet,
    }

    impl OwnedResource for TestResource {
        fn owners(&self) -> &OwnerSet {
            &self.owners
        }
    }

    fn owned_by(ids: &[&str]) -> TestResource {
        TestResource {
            owners: OwnerSet::from_ids(ids.iter().map(|id| id.to_string()).collect()).unwrap(),
        }
    }

    fn make_user(user_id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
            issued_at: 0,
            expires_at: i64::MAX,
        }
    }

    #[test]
    fn ownership_verification_passes_for_any_owner() {
        let resource = owned_by(&["user_123", "user_789"]);

        assert!(resource.verify_ownership(&make_user("user_123")).is_ok());
        assert!(resource.verify_ownership(&make_user("user_789")).is_ok());
    }

    #[test]
    fn ownership_verification_fails_for_non_owner() {
        let resource = owned_by(&["user_123"]);

        let result = resource.verify_ownership(&make_user("user_456"));
        assert!(matches!(result, Err(OwnershipError::NotOwner { .. })));
    }

    #[test]
    fn unowned_resource_matches_nobody() {
        let resource = TestResource {
            owners: OwnerSet::default(),
        };

        assert!(resource.verify_ownership(&make_user("")).is_err());
        assert!(resource.verify_ownership(&make_user("user_123")).is_err());
    }

    #[test]
    fn visible_to_hides_foreign_resources() {
        let user = make_user("user_123");

        assert!(Some(owned_by(&["user_123"])).visible_to(&user).is_ok());
        assert_eq!(
            Some(owned_by(&["user_456"])).visible_to(&user).err(),
            Some(OwnershipError::NotFound)
        );
        assert_eq!(
            None::<TestResource>.visible_to(&user).err(),
            Some(OwnershipError::NotFound)
        );
    }
}
