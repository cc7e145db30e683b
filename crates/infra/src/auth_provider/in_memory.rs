use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::watch;
use uuid::Uuid;

use malldir_core::IdentityId;

use super::r#trait::{AuthProvider, AuthProviderError, AuthUser};

/// Minimum password length accepted on account creation.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    user: AuthUser,
    password: String,
}

/// In-memory auth provider for tests/dev.
///
/// Credentials are held in process memory only. Session notifications are
/// emitted only when the signed-in user actually changes.
#[derive(Debug)]
pub struct InMemoryAuthProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: watch::Sender<Option<AuthUser>>,
    outage: RwLock<Option<String>>,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        let (session, _rx) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session,
            outage: RwLock::new(None),
        }
    }

    /// Seed an account (signed out).
    pub fn with_account(self, email: &str, password: &str) -> Result<Self, AuthProviderError> {
        self.register(email, password)?;
        Ok(self)
    }

    /// Mark `email` as the session restored at startup, without a sign-in.
    pub fn restore_session(&self, email: &str) -> Result<AuthUser, AuthProviderError> {
        let user = self
            .lookup(email)?
            .map(|a| a.user)
            .ok_or(AuthProviderError::InvalidCredentials)?;
        self.session.send_replace(Some(user.clone()));
        Ok(user)
    }

    /// Make every call fail with `AuthProviderError::Unavailable` until cleared.
    pub fn set_outage(&self, reason: Option<String>) {
        if let Ok(mut outage) = self.outage.write() {
            *outage = reason;
        }
    }

    pub fn current(&self) -> Option<AuthUser> {
        self.session.borrow().clone()
    }

    /// Number of live session subscriptions.
    pub fn session_listeners(&self) -> usize {
        self.session.receiver_count()
    }

    fn check_available(&self) -> Result<(), AuthProviderError> {
        match self.outage.read() {
            Ok(outage) => match outage.as_ref() {
                Some(reason) => Err(AuthProviderError::Unavailable(reason.clone())),
                None => Ok(()),
            },
            Err(_) => Err(AuthProviderError::Unavailable("lock poisoned".to_string())),
        }
    }

    fn lookup(&self, email: &str) -> Result<Option<Account>, AuthProviderError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| AuthProviderError::Unavailable("lock poisoned".to_string()))?;
        Ok(accounts.get(&normalize(email)).cloned())
    }

    fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthProviderError> {
        let key = normalize(email);
        if !is_plausible_email(&key) {
            return Err(AuthProviderError::InvalidEmail(email.to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthProviderError::WeakPassword {
                min_len: MIN_PASSWORD_LEN,
            });
        }

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| AuthProviderError::Unavailable("lock poisoned".to_string()))?;
        if accounts.contains_key(&key) {
            return Err(AuthProviderError::EmailInUse(email.to_string()));
        }

        let user = AuthUser {
            id: IdentityId::new(Uuid::now_v7().simple().to_string()),
            email: key.clone(),
        };
        accounts.insert(
            key,
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        Ok(user)
    }

    fn publish(&self, next: Option<AuthUser>) {
        self.session.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[async_trait::async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthProviderError> {
        self.check_available()?;
        self.register(email, password)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthProviderError> {
        self.check_available()?;
        let account = self
            .lookup(email)?
            .filter(|a| a.password == password)
            .ok_or(AuthProviderError::InvalidCredentials)?;

        self.publish(Some(account.user.clone()));
        Ok(account.user)
    }

    async fn sign_out(&self) -> Result<(), AuthProviderError> {
        self.check_available()?;
        self.publish(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_account_validates_input() {
        let provider = InMemoryAuthProvider::new();

        assert!(matches!(
            provider.create_account("not-an-email", "secret1").await,
            Err(AuthProviderError::InvalidEmail(_))
        ));
        assert!(matches!(
            provider.create_account("ops@mall.test", "123").await,
            Err(AuthProviderError::WeakPassword { min_len: 6 })
        ));

        provider.create_account("ops@mall.test", "secret1").await.unwrap();
        assert!(matches!(
            provider.create_account("OPS@mall.test", "secret2").await,
            Err(AuthProviderError::EmailInUse(_))
        ));
    }

    #[tokio::test]
    async fn create_account_does_not_start_a_session() {
        let provider = InMemoryAuthProvider::new();
        provider.create_account("ops@mall.test", "secret1").await.unwrap();
        assert_eq!(provider.current(), None);
    }

    #[tokio::test]
    async fn sign_in_and_out_notify_subscribers_once() {
        let provider = InMemoryAuthProvider::new()
            .with_account("ops@mall.test", "secret1")
            .unwrap();
        let mut rx = provider.subscribe();
        assert!(!rx.has_changed().unwrap());

        let user = provider.sign_in("ops@mall.test", "secret1").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref(), Some(&user));

        // Same user again: no new notification.
        provider.sign_in("ops@mall.test", "secret1").await.unwrap();
        assert!(!rx.has_changed().unwrap());

        provider.sign_out().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), None);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let provider = InMemoryAuthProvider::new()
            .with_account("ops@mall.test", "secret1")
            .unwrap();
        assert_eq!(
            provider.sign_in("ops@mall.test", "guess").await,
            Err(AuthProviderError::InvalidCredentials)
        );
        assert_eq!(provider.current(), None);
    }

    #[tokio::test]
    async fn restored_session_is_visible_to_new_subscribers() {
        let provider = InMemoryAuthProvider::new()
            .with_account("ops@mall.test", "secret1")
            .unwrap();
        let user = provider.restore_session("ops@mall.test").unwrap();

        let rx = provider.subscribe();
        assert_eq!(rx.borrow().as_ref(), Some(&user));
    }

    #[tokio::test]
    async fn outage_fails_every_call() {
        let provider = InMemoryAuthProvider::new()
            .with_account("ops@mall.test", "secret1")
            .unwrap();
        provider.set_outage(Some("network".into()));

        assert!(matches!(
            provider.sign_in("ops@mall.test", "secret1").await,
            Err(AuthProviderError::Unavailable(_))
        ));
        assert!(matches!(provider.sign_out().await, Err(AuthProviderError::Unavailable(_))));
    }
}
