//! Shared fixtures for the storefront test suites.

#![allow(dead_code, clippy::unwrap_used)]

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use canvas_gallery_core::{Email, PaintingId, UserId, UserRole};
use canvas_gallery_storefront::db::{MemoryStore, Store};
use canvas_gallery_storefront::models::{
    AdminContact, CheckoutRequest, DeliveryAddress, NewUser, Painting, PaintingDraft, User,
};
use canvas_gallery_storefront::services::cart::CartService;
use canvas_gallery_storefront::services::auth::AuthService;
use canvas_gallery_storefront::services::notify::{
    Notifier, NotifyError, OrderConfirmation, WelcomeMessage,
};
use canvas_gallery_storefront::services::orders::OrderService;
use canvas_gallery_storefront::services::users::UserService;

/// Notifier that remembers what it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OrderConfirmation>>,
    welcomed: Mutex<Vec<WelcomeMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OrderConfirmation> {
        self.sent.lock().unwrap().clone()
    }

    pub fn welcomed(&self) -> Vec<WelcomeMessage> {
        self.welcomed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn order_placed(&self, confirmation: &OrderConfirmation) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(confirmation.clone());
        if self.fail {
            return Err(NotifyError::InvalidAddress(confirmation.recipient.clone()));
        }
        Ok(())
    }

    async fn account_created(&self, welcome: &WelcomeMessage) -> Result<(), NotifyError> {
        self.welcomed.lock().unwrap().push(welcome.clone());
        if self.fail {
            return Err(NotifyError::InvalidAddress(welcome.recipient.clone()));
        }
        Ok(())
    }
}

pub fn admin_contact() -> AdminContact {
    AdminContact {
        name: "Gallery Desk".to_string(),
        email: "desk@canvasgallery.in".to_string(),
        phone: "+91 98450 12345".to_string(),
    }
}

/// An in-memory gallery with a recording notifier.
pub struct Gallery {
    pub store: MemoryStore,
    pub notifier: Arc<RecordingNotifier>,
    pub contact: AdminContact,
}

impl Gallery {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::default())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        Self {
            store: MemoryStore::new(),
            notifier: Arc::new(notifier),
            contact: admin_contact(),
        }
    }

    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(&self.store, self.notifier.as_ref(), &self.contact)
    }

    pub fn cart(&self) -> CartService<'_> {
        CartService::new(&self.store)
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.store, self.notifier.as_ref())
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(&self.store)
    }

    pub async fn user(&self, name: &str, email: &str) -> User {
        let mut uow = self.store.begin().await.unwrap();
        let user = uow
            .insert_user(&NewUser {
                name: name.to_string(),
                email: Email::parse(email).unwrap(),
                phone: None,
                password_hash: "not-a-real-hash".to_string(),
            })
            .await
            .unwrap();
        uow.commit().await.unwrap();
        user
    }

    pub async fn admin(&self, name: &str, email: &str) -> User {
        self.user(name, email).await;
        self.promote(email).await
    }

    /// Grant the admin role to an existing account.
    pub async fn promote(&self, email: &str) -> User {
        let mut uow = self.store.begin().await.unwrap();
        let email = Email::parse(email).unwrap();
        let user = uow.find_user_by_email(&email).await.unwrap().unwrap();
        uow.set_user_role(user.id, UserRole::Admin).await.unwrap();
        uow.commit().await.unwrap();
        User {
            role: UserRole::Admin,
            ..user
        }
    }

    pub async fn painting(&self, title: &str, price: &str, stock: i32) -> Painting {
        let mut uow = self.store.begin().await.unwrap();
        let painting = uow.insert_painting(&draft(title, price, stock)).await.unwrap();
        uow.commit().await.unwrap();
        painting
    }

    /// Withdraw a painting without touching its stock.
    pub async fn withdraw(&self, id: PaintingId) {
        let mut uow = self.store.begin().await.unwrap();
        uow.set_painting_available(id, false).await.unwrap();
        uow.commit().await.unwrap();
    }

    pub async fn reload(&self, id: PaintingId) -> Painting {
        let mut uow = self.store.begin().await.unwrap();
        uow.find_painting(id).await.unwrap().unwrap()
    }

    pub async fn cart_size(&self, user: UserId) -> usize {
        self.cart().get(user).await.unwrap().items.len()
    }

    pub async fn order_count(&self) -> i64 {
        let mut uow = self.store.begin().await.unwrap();
        uow.order_stats().await.unwrap().total_orders
    }
}

pub fn draft(title: &str, price: &str, stock: i32) -> PaintingDraft {
    PaintingDraft {
        title: title.to_string(),
        artist_name: "Anjali Rao".to_string(),
        description: Some("Oil on linen".to_string()),
        medium: Some("Oil".to_string()),
        height_cm: None,
        width_cm: None,
        depth_cm: None,
        year_created: Some(2023),
        price: money(price),
        stock_quantity: stock,
        is_available: stock > 0,
    }
}

pub fn money(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

pub fn delivery_address() -> DeliveryAddress {
    DeliveryAddress {
        street: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        country: "India".to_string(),
        pincode: "560001".to_string(),
    }
}

pub fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        delivery_address: delivery_address(),
        notes: Some("Please call before delivery".to_string()),
    }
}
