//! Auth gate: the state machine over provider session notifications.
//!
//! ```text
//! provider notification
//!   ↓
//! Some(user) → resolve role from users/<id> (create profile if absent)
//!            → actor = user id → Authenticated(identity)
//! None       → actor = anonymous → Unauthenticated
//! ```
//!
//! Transitions are applied one at a time. The gate is the only writer of both
//! its own state and the audit actor context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde_json::json;
use tokio::sync::{Mutex, watch};

use malldir_audit::{ActorWriter, AuditLogger};
use malldir_core::{CREATED_AT, DocumentId, IdentityId};
use malldir_infra::{AuthProvider, AuthUser, DocumentStore, DocumentWrite};

use crate::authorize::{self, AccessDenied};
use crate::error::AuthError;
use crate::principal::{Identity, UserProfile};
use crate::roles::Role;

/// Collection holding one profile document per identity.
pub const USERS_COLLECTION: &str = "users";

/// Audit module name for authentication events.
pub const AUTH_MODULE: &str = "AuthService";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(Identity),
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            AuthState::Unauthenticated => None,
        }
    }

    fn identity_id(&self) -> Option<&IdentityId> {
        self.identity().map(|i| &i.id)
    }
}

pub struct AuthGate<S, P> {
    store: S,
    provider: P,
    logger: AuditLogger<S>,
    actor: ActorWriter,
    state: watch::Sender<AuthState>,
    transitions: Mutex<()>,
    started: AtomicBool,
    ready: AtomicBool,
    /// Dropped with the gate; closing it stops the listener task.
    shutdown: watch::Sender<()>,
}

impl<S, P> AuthGate<S, P>
where
    S: DocumentStore + Clone + 'static,
    P: AuthProvider + 'static,
{
    pub fn new(store: S, provider: P, logger: AuditLogger<S>, actor: ActorWriter) -> Self {
        let (state, _rx) = watch::channel(AuthState::Unauthenticated);
        let (shutdown, _closed) = watch::channel(());
        Self {
            store,
            provider,
            logger,
            actor,
            state,
            transitions: Mutex::new(()),
            started: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Apply the session known at startup and start following notifications.
    ///
    /// Resolves once, with the startup identity. Guards evaluated before this
    /// resolves observe `Unauthenticated`.
    pub async fn init(self: &Arc<Self>) -> Result<Option<Identity>, AuthError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AuthError::AlreadyInitialized);
        }

        let mut rx = self.provider.subscribe();
        let startup = rx.borrow_and_update().clone();
        self.apply(startup).await;
        self.ready.store(true, Ordering::SeqCst);

        tokio::spawn(Self::listen(
            Arc::downgrade(self),
            rx,
            self.shutdown.subscribe(),
        ));

        let identity = self.current_user();
        tracing::debug!(
            user = identity.as_ref().map(|i| i.id.as_str()),
            "auth gate initialized"
        );
        Ok(identity)
    }

    pub fn is_initialized(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Current state; `Unauthenticated` until `init` has resolved.
    pub fn state(&self) -> AuthState {
        if self.is_initialized() {
            self.state.borrow().clone()
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Follow state changes (e.g. to re-render navigation).
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.state().identity().cloned()
    }

    pub fn is_admin(&self) -> bool {
        self.state().identity().is_some_and(Identity::is_admin)
    }

    pub fn require_auth(&self) -> Result<Identity, AccessDenied> {
        authorize::require_auth(self.state().identity()).cloned()
    }

    pub fn require_admin(&self) -> Result<Identity, AccessDenied> {
        authorize::require_admin(self.state().identity()).cloned()
    }

    /// Register an account with `role`, then sign it in.
    ///
    /// The profile is written before the sign-in so the transition handler
    /// finds the requested role instead of creating a default one.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Identity, AuthError> {
        self.ensure_initialized()?;

        let result = async {
            let user = self.provider.create_account(email, password).await?;
            let profile = UserProfile {
                email: user.email.clone(),
                role,
            };
            let write = DocumentWrite::from_serializable(&profile)?.with_server_timestamp(CREATED_AT);
            self.store
                .set(USERS_COLLECTION, &profile_id(&user.id), write)
                .await?;
            self.provider.sign_in(email, password).await?;
            self.wait_until(Some(&user.id)).await
        }
        .await;

        match result {
            Ok(identity) => {
                self.logger
                    .info(
                        "User signed up",
                        AUTH_MODULE,
                        json!({ "email": email, "role": role }),
                    )
                    .await;
                identity.ok_or(AuthError::Closed)
            }
            Err(err) => {
                self.logger
                    .error("Sign up failed", AUTH_MODULE, json!({ "error": err.to_string() }))
                    .await;
                Err(err)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.ensure_initialized()?;

        let result = async {
            let user = self.provider.sign_in(email, password).await?;
            self.wait_until(Some(&user.id)).await
        }
        .await;

        match result {
            Ok(identity) => {
                self.logger
                    .info("User signed in", AUTH_MODULE, json!({ "email": email }))
                    .await;
                identity.ok_or(AuthError::Closed)
            }
            Err(err) => {
                self.logger
                    .error("Sign in failed", AUTH_MODULE, json!({ "error": err.to_string() }))
                    .await;
                Err(err)
            }
        }
    }

    /// Sign out. The entry is written first so it is attributed to the user
    /// who is leaving.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.ensure_initialized()?;

        let user_id = self.current_user().map(|i| i.id);
        self.logger
            .info("User signed out", AUTH_MODULE, json!({ "userId": user_id }))
            .await;

        let result = async {
            self.provider.sign_out().await?;
            self.wait_until(None).await.map(|_| ())
        }
        .await;

        if let Err(err) = &result {
            self.logger
                .error("Sign out failed", AUTH_MODULE, json!({ "error": err.to_string() }))
                .await;
        }
        result
    }

    fn ensure_initialized(&self) -> Result<(), AuthError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(AuthError::NotInitialized)
        }
    }

    async fn listen(
        gate: Weak<Self>,
        mut rx: watch::Receiver<Option<AuthUser>>,
        mut shutdown: watch::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                // Only ever resolves with Err, once the gate is dropped.
                _ = shutdown.changed() => break,
            }
            let next = rx.borrow_and_update().clone();
            let Some(gate) = gate.upgrade() else {
                break;
            };
            gate.apply(next).await;
        }
        tracing::debug!("auth gate listener stopped");
    }

    /// Wait until the gate state names `target` (or nobody, for `None`).
    async fn wait_until(&self, target: Option<&IdentityId>) -> Result<Option<Identity>, AuthError> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| s.identity_id() == target)
            .await
            .map_err(|_| AuthError::Closed)?;
        Ok(state.identity().cloned())
    }

    async fn apply(&self, next: Option<AuthUser>) {
        let _serial = self.transitions.lock().await;

        match next {
            Some(user) => {
                let role = self.resolve_role(&user).await;
                let identity = Identity {
                    id: user.id,
                    email: user.email,
                    role,
                };
                let details = json!({ "userId": identity.id, "role": role });
                self.actor.set(identity.id.clone());
                self.state
                    .send_replace(AuthState::Authenticated(identity));
                self.logger
                    .info("User authenticated", AUTH_MODULE, details)
                    .await;
            }
            None => {
                self.state.send_replace(AuthState::Unauthenticated);
                self.actor.clear();
                tracing::debug!("session ended");
            }
        }
    }

    /// Role from the profile document, creating the profile on first sign-in.
    ///
    /// Any failure admits the identity with the default role.
    async fn resolve_role(&self, user: &AuthUser) -> Role {
        let id = profile_id(&user.id);

        match self.store.get(USERS_COLLECTION, &id).await {
            Ok(Some(doc)) => doc
                .fields
                .get("role")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            Ok(None) => {
                let profile = UserProfile {
                    email: user.email.clone(),
                    role: Role::default(),
                };
                let created = match DocumentWrite::from_serializable(&profile) {
                    Ok(write) => {
                        self.store
                            .set(USERS_COLLECTION, &id, write.with_server_timestamp(CREATED_AT))
                            .await
                    }
                    Err(err) => Err(err),
                };
                match created {
                    Ok(()) => {
                        self.logger
                            .info(
                                "User profile created",
                                AUTH_MODULE,
                                json!({ "userId": user.id, "role": profile.role }),
                            )
                            .await;
                    }
                    Err(err) => {
                        self.logger
                            .error(
                                "Failed to create user profile",
                                AUTH_MODULE,
                                json!({ "userId": user.id, "error": err.to_string() }),
                            )
                            .await;
                    }
                }
                profile.role
            }
            Err(err) => {
                self.logger
                    .error(
                        "Failed to resolve user role",
                        AUTH_MODULE,
                        json!({ "userId": user.id, "error": err.to_string() }),
                    )
                    .await;
                Role::default()
            }
        }
    }
}

fn profile_id(id: &IdentityId) -> DocumentId {
    DocumentId::new(id.as_str())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use malldir_audit::{ANONYMOUS, LogEntry, LogLevel, actor_context};
    use malldir_infra::{
        AuthProviderError, Document, InMemoryAuthProvider, InMemoryDocumentStore, Query,
        StoreError,
    };

    use super::*;

    type Store = Arc<InMemoryDocumentStore>;
    type Gate = AuthGate<Store, Arc<InMemoryAuthProvider>>;

    struct Harness {
        gate: Arc<Gate>,
        store: Store,
        provider: Arc<InMemoryAuthProvider>,
        audit: AuditLogger<Store>,
    }

    impl Harness {
        fn new(provider: InMemoryAuthProvider) -> Self {
            let store = InMemoryDocumentStore::arc();
            let provider = Arc::new(provider);
            let (writer, ctx) = actor_context();
            let audit = AuditLogger::new(store.clone(), ctx);
            let gate = Arc::new(AuthGate::new(
                store.clone(),
                provider.clone(),
                audit.clone(),
                writer,
            ));
            Self {
                gate,
                store,
                provider,
                audit,
            }
        }

        async fn entries(&self) -> Vec<LogEntry> {
            self.audit.entries().await.unwrap()
        }

        async fn entry(&self, action: &str) -> LogEntry {
            self.entries()
                .await
                .into_iter()
                .find(|e| e.action == action)
                .unwrap_or_else(|| panic!("no '{action}' entry"))
        }

        async fn seed_profile(&self, id: &IdentityId, role: Role) {
            let profile = UserProfile {
                email: "seeded@mall.test".into(),
                role,
            };
            self.store
                .set(
                    USERS_COLLECTION,
                    &profile_id(id),
                    DocumentWrite::from_serializable(&profile).unwrap(),
                )
                .await
                .unwrap();
        }
    }

    /// Store whose `add` suspends a few times before committing.
    #[derive(Clone)]
    struct SlowAppends {
        inner: Store,
        yields: usize,
    }

    #[async_trait::async_trait]
    impl DocumentStore for SlowAppends {
        async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
            self.inner.get(collection, id).await
        }

        async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
            self.inner.query(collection, query).await
        }

        async fn add(&self, collection: &str, write: DocumentWrite) -> Result<DocumentId, StoreError> {
            for _ in 0..self.yields {
                tokio::task::yield_now().await;
            }
            self.inner.add(collection, write).await
        }

        async fn set(
            &self,
            collection: &str,
            id: &DocumentId,
            write: DocumentWrite,
        ) -> Result<(), StoreError> {
            self.inner.set(collection, id, write).await
        }

        async fn update(
            &self,
            collection: &str,
            id: &DocumentId,
            write: DocumentWrite,
        ) -> Result<(), StoreError> {
            self.inner.update(collection, id, write).await
        }

        async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
            self.inner.delete(collection, id).await
        }
    }

    fn provider_with_ops() -> InMemoryAuthProvider {
        InMemoryAuthProvider::new()
            .with_account("ops@mall.test", "secret1")
            .unwrap()
    }

    #[tokio::test]
    async fn guards_deny_before_init_even_with_restored_session() {
        let h = Harness::new(provider_with_ops());
        h.provider.restore_session("ops@mall.test").unwrap();

        assert!(!h.gate.is_initialized());
        assert!(!h.gate.is_admin());
        assert_eq!(h.gate.require_auth(), Err(AccessDenied::Unauthenticated));
        assert_eq!(h.gate.current_user(), None);
    }

    #[tokio::test]
    async fn init_without_session_resolves_empty() {
        let h = Harness::new(provider_with_ops());

        assert_eq!(h.gate.init().await.unwrap(), None);
        assert!(h.gate.is_initialized());
        assert_eq!(h.gate.state(), AuthState::Unauthenticated);
        assert!(h.entries().await.is_empty());
    }

    #[tokio::test]
    async fn init_twice_is_rejected() {
        let h = Harness::new(provider_with_ops());
        h.gate.init().await.unwrap();
        assert_eq!(h.gate.init().await, Err(AuthError::AlreadyInitialized));
    }

    #[tokio::test]
    async fn restored_session_creates_default_profile() {
        let h = Harness::new(provider_with_ops());
        let user = h.provider.restore_session("ops@mall.test").unwrap();

        let identity = h.gate.init().await.unwrap().unwrap();
        assert_eq!(identity.id, user.id);
        assert_eq!(identity.role, Role::User);
        assert!(!h.gate.is_admin());
        assert_eq!(h.gate.require_admin(), Err(AccessDenied::NotAdmin));

        let profile = h
            .store
            .get(USERS_COLLECTION, &profile_id(&user.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.fields["role"], "user");
        assert_eq!(profile.fields["email"], "ops@mall.test");
        assert!(profile.fields.contains_key(CREATED_AT));

        // The actor only moves once the role is known.
        let created = h.entry("User profile created").await;
        assert_eq!(created.user_id, ANONYMOUS);
        let authenticated = h.entry("User authenticated").await;
        assert_eq!(authenticated.user_id, user.id.as_str());
        assert_eq!(authenticated.details["role"], "user");
    }

    #[tokio::test]
    async fn admin_role_comes_from_existing_profile() {
        let h = Harness::new(provider_with_ops());
        let user = h.provider.restore_session("ops@mall.test").unwrap();
        h.seed_profile(&user.id, Role::Admin).await;

        h.gate.init().await.unwrap();

        assert!(h.gate.is_admin());
        assert_eq!(h.gate.require_admin().unwrap().id, user.id);
        assert!(h.entries().await.iter().all(|e| e.action != "User profile created"));
    }

    #[tokio::test]
    async fn unknown_stored_role_falls_back_to_user() {
        let h = Harness::new(provider_with_ops());
        let user = h.provider.restore_session("ops@mall.test").unwrap();
        h.store
            .set(
                USERS_COLLECTION,
                &profile_id(&user.id),
                DocumentWrite::from_serializable(&serde_json::json!({"role": "superuser"})).unwrap(),
            )
            .await
            .unwrap();

        let identity = h.gate.init().await.unwrap().unwrap();
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn role_lookup_failure_admits_as_user_and_logs_error() {
        let h = Harness::new(provider_with_ops());
        h.provider.restore_session("ops@mall.test").unwrap();
        h.store.fail_collection(USERS_COLLECTION, "permission denied");

        let identity = h.gate.init().await.unwrap().unwrap();
        assert_eq!(identity.role, Role::User);

        let failure = h.entry("Failed to resolve user role").await;
        assert_eq!(failure.level, LogLevel::Error);
    }

    #[tokio::test]
    async fn sign_in_then_out_moves_the_actor() {
        let h = Harness::new(provider_with_ops());
        h.gate.init().await.unwrap();

        let identity = h.gate.sign_in("ops@mall.test", "secret1").await.unwrap();
        assert_eq!(h.gate.current_user(), Some(identity.clone()));
        assert_eq!(h.audit.actor_id(), identity.id.as_str());
        assert_eq!(h.entry("User signed in").await.user_id, identity.id.as_str());

        h.gate.sign_out().await.unwrap();
        assert_eq!(h.gate.current_user(), None);
        assert_eq!(h.audit.actor_id(), ANONYMOUS);

        let signed_out = h.entry("User signed out").await;
        assert_eq!(signed_out.user_id, identity.id.as_str());
        assert_eq!(signed_out.details["userId"], identity.id.as_str());
    }

    #[tokio::test]
    async fn failed_sign_in_is_logged_and_changes_nothing() {
        let h = Harness::new(provider_with_ops());
        h.gate.init().await.unwrap();

        let err = h.gate.sign_in("ops@mall.test", "wrong").await.unwrap_err();
        assert_eq!(err, AuthError::Provider(AuthProviderError::InvalidCredentials));
        assert_eq!(h.gate.state(), AuthState::Unauthenticated);

        let failure = h.entry("Sign in failed").await;
        assert_eq!(failure.level, LogLevel::Error);
        assert_eq!(failure.user_id, ANONYMOUS);
    }

    #[tokio::test]
    async fn sign_up_with_admin_role_grants_admin() {
        let h = Harness::new(InMemoryAuthProvider::new());
        h.gate.init().await.unwrap();

        let identity = h
            .gate
            .sign_up("manager@mall.test", "hunter22", Role::Admin)
            .await
            .unwrap();

        assert_eq!(identity.role, Role::Admin);
        assert!(h.gate.is_admin());
        let signed_up = h.entry("User signed up").await;
        assert_eq!(signed_up.user_id, identity.id.as_str());
        assert_eq!(signed_up.details["role"], "admin");
        assert!(h.entries().await.iter().all(|e| e.action != "User profile created"));
    }

    #[tokio::test]
    async fn sign_up_with_taken_email_fails() {
        let h = Harness::new(provider_with_ops());
        h.gate.init().await.unwrap();

        let err = h
            .gate
            .sign_up("ops@mall.test", "secret1", Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Provider(AuthProviderError::EmailInUse(_))));
        assert_eq!(h.entry("Sign up failed").await.level, LogLevel::Error);
    }

    #[tokio::test]
    async fn account_operations_require_init() {
        let h = Harness::new(provider_with_ops());
        assert_eq!(
            h.gate.sign_in("ops@mall.test", "secret1").await,
            Err(AuthError::NotInitialized)
        );
        assert_eq!(h.gate.sign_out().await, Err(AuthError::NotInitialized));
        assert_eq!(h.provider.current(), None);
    }

    #[tokio::test]
    async fn external_session_changes_are_followed() {
        let h = Harness::new(provider_with_ops());
        h.gate.init().await.unwrap();
        let mut states = h.gate.subscribe();

        // Sign in through the provider directly, as another tab would.
        let user = h.provider.sign_in("ops@mall.test", "secret1").await.unwrap();
        let state = states
            .wait_for(|s| s.identity().is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(state.identity().map(|i| &i.id), Some(&user.id));
    }

    #[tokio::test]
    async fn guards_stay_closed_while_init_is_logging() {
        let inner = InMemoryDocumentStore::arc();
        let store = SlowAppends {
            inner: inner.clone(),
            yields: 5,
        };
        let provider = Arc::new(provider_with_ops());
        let user = provider.restore_session("ops@mall.test").unwrap();
        let admin = UserProfile {
            email: user.email.clone(),
            role: Role::Admin,
        };
        inner
            .set(
                USERS_COLLECTION,
                &profile_id(&user.id),
                DocumentWrite::from_serializable(&admin).unwrap(),
            )
            .await
            .unwrap();

        let (writer, ctx) = actor_context();
        let logger = AuditLogger::new(store.clone(), ctx);
        let gate = Arc::new(AuthGate::new(store, provider, logger, writer));

        let init = tokio::spawn({
            let gate = gate.clone();
            async move { gate.init().await }
        });

        let mut checks = 0;
        while !init.is_finished() {
            assert!(!gate.is_initialized());
            assert!(!gate.is_admin());
            assert_eq!(gate.current_user(), None);
            assert_eq!(gate.require_admin(), Err(AccessDenied::Unauthenticated));
            checks += 1;
            tokio::task::yield_now().await;
        }
        assert!(checks > 1);

        let identity = init.await.unwrap().unwrap().unwrap();
        assert_eq!(identity.role, Role::Admin);
        assert!(gate.is_admin());
    }

    #[tokio::test]
    async fn actor_follows_the_identity_across_a_switch() {
        let provider = provider_with_ops()
            .with_account("desk@mall.test", "secret2")
            .unwrap();
        let h = Harness::new(provider);
        h.gate.init().await.unwrap();

        let first = h.gate.sign_in("ops@mall.test", "secret1").await.unwrap();
        // Switch without signing out, as another tab would.
        let second = h.provider.sign_in("desk@mall.test", "secret2").await.unwrap();
        let mut states = h.gate.subscribe();
        states
            .wait_for(|s| s.identity().is_some_and(|i| i.id == second.id))
            .await
            .unwrap();

        assert_eq!(h.audit.actor_id(), second.id.as_str());
        let profiles: Vec<_> = h
            .entries()
            .await
            .into_iter()
            .filter(|e| e.action == "User profile created")
            .map(|e| e.user_id)
            .collect();
        assert_eq!(profiles, vec![ANONYMOUS.to_string(), first.id.to_string()]);
    }

    #[tokio::test]
    async fn dropping_the_gate_stops_the_listener() {
        let h = Harness::new(provider_with_ops());
        h.gate.init().await.unwrap();
        assert_eq!(h.provider.session_listeners(), 1);

        let Harness { gate, provider, .. } = h;
        drop(gate);
        for _ in 0..10 {
            if provider.session_listeners() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(provider.session_listeners(), 0);
    }
}
