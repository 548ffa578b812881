//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Store;
use crate::models::AdminContact;
use crate::services::admin::AdminService;
use crate::services::auth::AuthService;
use crate::services::cart::CartService;
use crate::services::catalog::CatalogService;
use crate::services::notify::Notifier;
use crate::services::orders::OrderService;
use crate::services::users::UserService;
use crate::services::wishlist::WishlistService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and hands out services that
/// borrow the shared store, notifier and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                notifier,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn admin_contact(&self) -> &AdminContact {
        &self.inner.config.admin_contact
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store(), self.inner.notifier.as_ref())
    }

    #[must_use]
    pub fn users(&self) -> UserService<'_> {
        UserService::new(self.store())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.store())
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self.store())
    }

    #[must_use]
    pub fn wishlist(&self) -> WishlistService<'_> {
        WishlistService::new(self.store())
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(
            self.store(),
            self.inner.notifier.as_ref(),
            self.admin_contact(),
        )
    }

    #[must_use]
    pub fn admin(&self) -> AdminService<'_> {
        AdminService::new(self.store())
    }
}
