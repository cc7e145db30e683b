use serde::Serialize;
use thiserror::Error;

use crate::Identity;

/// Why a page guard refused access.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDenied {
    #[error("sign-in required")]
    Unauthenticated,

    #[error("admin role required")]
    NotAdmin,
}

impl AccessDenied {
    /// Page the navigation layer sends the visitor to.
    pub fn redirect_to(&self) -> &'static str {
        match self {
            AccessDenied::Unauthenticated => "/login.html",
            AccessDenied::NotAdmin => "/index.html",
        }
    }
}

/// Require a signed-in identity.
///
/// - No IO
/// - No panics
pub fn require_auth(identity: Option<&Identity>) -> Result<&Identity, AccessDenied> {
    identity.ok_or(AccessDenied::Unauthenticated)
}

/// Require a signed-in identity holding the admin role.
pub fn require_admin(identity: Option<&Identity>) -> Result<&Identity, AccessDenied> {
    let identity = require_auth(identity)?;
    if identity.is_admin() {
        Ok(identity)
    } else {
        Err(AccessDenied::NotAdmin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use malldir_core::IdentityId;

    fn identity(role: Role) -> Identity {
        Identity {
            id: IdentityId::new("uid-1"),
            email: "ops@mall.test".into(),
            role,
        }
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        assert_eq!(require_auth(None), Err(AccessDenied::Unauthenticated));
        let err = require_admin(None).unwrap_err();
        assert_eq!(err, AccessDenied::Unauthenticated);
        assert_eq!(err.redirect_to(), "/login.html");
    }

    #[test]
    fn plain_user_passes_auth_but_not_admin() {
        let user = identity(Role::User);
        assert_eq!(require_auth(Some(&user)), Ok(&user));

        let err = require_admin(Some(&user)).unwrap_err();
        assert_eq!(err, AccessDenied::NotAdmin);
        assert_eq!(err.redirect_to(), "/index.html");
    }

    #[test]
    fn admin_passes_both() {
        let admin = identity(Role::Admin);
        assert!(require_auth(Some(&admin)).is_ok());
        assert!(require_admin(Some(&admin)).is_ok());
    }
}
