//! Wiring: one store handle, one actor context, one logger, one gate, and the
//! four directory services, all sharing the same store.

use std::sync::Arc;

use malldir_audit::{AuditLogger, actor_context};
use malldir_auth::{AuthError, AuthGate, Identity};
use malldir_directory::{
    Category, CategoryService, EntityService, Floor, FloorService, ListFilter, OfferService,
    ServiceError, ShopService,
};
use malldir_infra::{AuthProvider, DocumentStore, InMemoryAuthProvider, InMemoryDocumentStore};

use crate::config::AppConfig;

/// Directory backed by the in-memory adapters (tests, local development).
pub type InMemoryDirectory = MallDirectory<Arc<InMemoryDocumentStore>, Arc<InMemoryAuthProvider>>;

pub struct MallDirectory<S, P> {
    store: S,
    logger: AuditLogger<S>,
    gate: Arc<AuthGate<S, P>>,
    shops: ShopService<S>,
    offers: OfferService<S>,
    categories: CategoryService<S>,
    floors: FloorService<S>,
}

impl<S, P> MallDirectory<S, P>
where
    S: DocumentStore + Clone + 'static,
    P: AuthProvider + 'static,
{
    pub fn new(store: S, provider: P, config: &AppConfig) -> Self {
        let (actor, ctx) = actor_context();
        let logger = AuditLogger::new(store.clone(), ctx)
            .with_context(config.log_context.clone())
            .with_collection(config.audit_collection.clone());
        let gate = Arc::new(AuthGate::new(store.clone(), provider, logger.clone(), actor));

        Self {
            shops: EntityService::new(store.clone(), logger.clone()),
            offers: EntityService::new(store.clone(), logger.clone()),
            categories: EntityService::new(store.clone(), logger.clone()),
            floors: EntityService::new(store.clone(), logger.clone()),
            store,
            logger,
            gate,
        }
    }

    /// Initialize the auth gate; resolves with the startup identity.
    pub async fn start(&self) -> Result<Option<Identity>, AuthError> {
        self.gate.init().await
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn logger(&self) -> &AuditLogger<S> {
        &self.logger
    }

    pub fn gate(&self) -> &Arc<AuthGate<S, P>> {
        &self.gate
    }

    pub fn shops(&self) -> &ShopService<S> {
        &self.shops
    }

    pub fn offers(&self) -> &OfferService<S> {
        &self.offers
    }

    pub fn categories(&self) -> &CategoryService<S> {
        &self.categories
    }

    pub fn floors(&self) -> &FloorService<S> {
        &self.floors
    }

    /// Create the default floors and categories when their collections are
    /// empty. Returns how many records were created.
    pub async fn seed_reference_data(&self) -> Result<usize, ServiceError> {
        let mut created = 0;

        if self.floors.list(ListFilter::new()).await?.is_empty() {
            for (number, name) in [(-1, "Parking"), (0, "Ground Floor"), (1, "First Floor")] {
                self.floors.create(&Floor::new(number, name)).await?;
                created += 1;
            }
        }

        if self.categories.list(ListFilter::new()).await?.is_empty() {
            for name in ["Electronics", "Fashion", "Food & Drink", "Services"] {
                self.categories.create(&Category::new(name)).await?;
                created += 1;
            }
        }

        Ok(created)
    }
}

/// Wire a directory over fresh in-memory adapters.
pub fn build_in_memory(config: &AppConfig) -> InMemoryDirectory {
    MallDirectory::new(
        InMemoryDocumentStore::arc(),
        Arc::new(InMemoryAuthProvider::new()),
        config,
    )
}
