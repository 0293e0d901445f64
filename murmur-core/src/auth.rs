use murmur_types::Identity;

use crate::config::AdminCredentials;
use crate::db::repositories::UserRepository;
use crate::error::{SocialError, SocialResult};

/// Resolves login attempts to an `Identity`
///
/// The configured administrator credential is checked first and yields an
/// administrator identity; otherwise the users table decides. Comparison is
/// exact and case-sensitive in both cases.
pub struct Authenticator {
    users: UserRepository,
    admin: Option<AdminCredentials>,
}

impl Authenticator {
    pub fn new(users: UserRepository, admin: Option<AdminCredentials>) -> Self {
        Self { users, admin }
    }

    /// Surrounding whitespace on either field is ignored, as at registration.
    pub fn authenticate(&self, username: &str, password: &str) -> SocialResult<Identity> {
        let (username, password) = (username.trim(), password.trim());
        if username.is_empty() || password.is_empty() {
            return Err(SocialError::validation("username and password are required"));
        }

        if let Some(admin) = &self.admin {
            if admin.username == username && admin.password == password {
                tracing::info!("Administrator {} logged in", username);
                return Ok(Identity::administrator(username));
            }
        }

        match self.users.verify_credentials(username, password)? {
            Some(user) => {
                tracing::info!("User {} logged in", user.username);
                Ok(Identity::regular(user.username))
            }
            None => {
                tracing::debug!("Rejected login for {}", username);
                Err(SocialError::InvalidCredentials)
            }
        }
    }

    /// Confirm that `identity` is the configured administrator
    ///
    /// The role flag alone is not trusted: the username must match the
    /// configured credential, and nothing passes when none is configured.
    pub fn authorize_admin(&self, identity: &Identity) -> SocialResult<()> {
        match &self.admin {
            None => Err(SocialError::forbidden("administrator login is disabled")),
            Some(admin) if identity.is_admin() && identity.username == admin.username => Ok(()),
            Some(_) => Err(SocialError::forbidden("administrator role required")),
        }
    }

    /// Whether `username` is held by the configured administrator
    pub fn is_admin_name(&self, username: &str) -> bool {
        self.admin
            .as_ref()
            .map_or(false, |admin| admin.username == username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{add_user, setup_test_pool};
    use murmur_types::Role;

    fn authenticator(admin: Option<AdminCredentials>) -> Authenticator {
        let pool = setup_test_pool();
        add_user(&pool, "alice");
        Authenticator::new(UserRepository::new(pool), admin)
    }

    fn root() -> AdminCredentials {
        AdminCredentials {
            username: "root".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn test_regular_login() {
        let auth = authenticator(Some(root()));
        let identity = auth.authenticate("alice", "pw").unwrap();
        assert_eq!(identity, Identity::regular("alice"));
    }

    #[test]
    fn test_admin_login() {
        let auth = authenticator(Some(root()));
        let identity = auth.authenticate("root", "hunter2").unwrap();
        assert_eq!(identity.role, Role::Administrator);
    }

    #[test]
    fn test_admin_disabled_without_credentials() {
        let auth = authenticator(None);
        assert!(matches!(
            auth.authenticate("root", "hunter2"),
            Err(SocialError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authorize_admin(&Identity::administrator("root")),
            Err(SocialError::Forbidden(_))
        ));
    }

    #[test]
    fn test_authorize_admin_checks_configured_name() {
        let auth = authenticator(Some(root()));
        let identity = auth.authenticate("root", "hunter2").unwrap();
        assert!(auth.authorize_admin(&identity).is_ok());

        // A hand-built identity with the administrator role but another name
        assert!(matches!(
            auth.authorize_admin(&Identity::administrator("mallory")),
            Err(SocialError::Forbidden(_))
        ));
        assert!(matches!(
            auth.authorize_admin(&Identity::regular("root")),
            Err(SocialError::Forbidden(_))
        ));
        assert!(auth.is_admin_name("root"));
        assert!(!auth.is_admin_name("alice"));
    }

    #[test]
    fn test_login_ignores_surrounding_whitespace() {
        let auth = authenticator(Some(root()));
        assert_eq!(
            auth.authenticate(" alice ", "pw\n").unwrap(),
            Identity::regular("alice")
        );
        assert!(auth.authenticate("root ", " hunter2").unwrap().is_admin());
        assert!(matches!(
            auth.authenticate("alice", "   "),
            Err(SocialError::Validation(_))
        ));
    }

    #[test]
    fn test_wrong_password_and_case() {
        let auth = authenticator(None);
        assert!(matches!(
            auth.authenticate("alice", "PW"),
            Err(SocialError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("Alice", "pw"),
            Err(SocialError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("  ", "pw"),
            Err(SocialError::Validation(_))
        ));
    }
}
