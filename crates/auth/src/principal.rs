use serde::{Deserialize, Serialize};

use malldir_core::IdentityId;

use crate::Role;

/// An authenticated identity with its resolved role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Body of an identity's document in the `users` collection.
///
/// `createdAt` is stamped by the store when the profile is first written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub role: Role,
}
