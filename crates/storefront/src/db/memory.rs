//! In-memory store.
//!
//! All state sits behind one async mutex. A unit of work holds the lock for
//! its whole lifetime and edits a private copy, which replaces the shared
//! state on commit. Units therefore run one at a time and a dropped unit
//! leaves no trace, matching what row locks and rollback give the
//! `PostgreSQL` store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use canvas_gallery_core::{
    AddressId, CartId, CartItemId, CurrencyCode, Email, OrderId, OrderItemId, OrderNumber,
    OrderStatus, PaintingId, PaymentMethod, UserId, UserRole, WishlistItemId,
};

use super::{RepositoryError, Store, UnitOfWork};
use crate::models::{
    Address, Cart, CartItem, DeliveryAddress, MonthlyRevenue, NewOrder, NewOrderItem, NewUser,
    Order, OrderItem, OrderStats, Page, PageRequest, Painting, PaintingDraft, PaintingQuery,
    PaintingRank, PaintingSort, PaintingStats, User, WishlistItem,
};

#[derive(Debug, Clone)]
struct StoredOrder {
    id: OrderId,
    order_number: OrderNumber,
    user_id: UserId,
    total_amount: Decimal,
    currency: CurrencyCode,
    delivery_address_id: AddressId,
    status: OrderStatus,
    payment_method: PaymentMethod,
    tracking_info: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: i32,
    users: BTreeMap<UserId, (User, String)>,
    addresses: BTreeMap<AddressId, Address>,
    paintings: BTreeMap<PaintingId, Painting>,
    carts: BTreeMap<CartId, Cart>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    wishlist: BTreeMap<WishlistItemId, WishlistItem>,
    orders: BTreeMap<OrderId, StoredOrder>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
    failing_sale: Option<PaintingId>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn order(&self, stored: &StoredOrder) -> Result<Order, RepositoryError> {
        let delivery_address = self
            .addresses
            .get(&stored.delivery_address_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order {} references missing address {}",
                    stored.id, stored.delivery_address_id
                ))
            })?;
        let items = self
            .order_items
            .values()
            .filter(|item| item.order_id == stored.id)
            .cloned()
            .collect();

        Ok(Order {
            id: stored.id,
            order_number: stored.order_number.clone(),
            user_id: stored.user_id,
            total_amount: stored.total_amount,
            currency: stored.currency,
            delivery_address,
            status: stored.status,
            payment_method: stored.payment_method,
            tracking_info: stored.tracking_info.clone(),
            notes: stored.notes.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            items,
        })
    }

    fn order_page<'a>(
        &self,
        orders: impl Iterator<Item = &'a StoredOrder>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut matching: Vec<&StoredOrder> = orders.collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let items = page
            .apply(matching)
            .into_iter()
            .map(|stored| self.order(stored))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, total))
    }

    fn saved_address_mut(&mut self, id: AddressId) -> Result<&mut Address, RepositoryError> {
        self.addresses
            .get_mut(&id)
            .filter(|address| address.is_saved)
            .ok_or(RepositoryError::NotFound)
    }

    fn new_address(
        &mut self,
        user_id: UserId,
        fields: &DeliveryAddress,
        is_saved: bool,
    ) -> Address {
        let address = Address {
            id: AddressId::new(self.next_id()),
            user_id,
            street: fields.street.clone(),
            city: fields.city.clone(),
            state: fields.state.clone(),
            country: fields.country.clone(),
            pincode: fields.pincode.clone(),
            is_default: false,
            is_saved,
            created_at: Utc::now(),
        };
        self.addresses.insert(address.id, address.clone());
        address
    }

    fn painting_mut(&mut self, id: PaintingId) -> Result<&mut Painting, RepositoryError> {
        self.paintings.get_mut(&id).ok_or(RepositoryError::NotFound)
    }
}

/// Store keeping everything in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `record_sale` on `painting` fail, simulating a
    /// database error in the middle of a checkout.
    pub async fn fail_sales_of(&self, painting: PaintingId) {
        self.state.lock().await.failing_sale = Some(painting);
    }

    /// Undo [`MemoryStore::fail_sales_of`].
    pub async fn clear_failures(&self) {
        self.state.lock().await.failing_sale = None;
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// A unit of work over a private copy of the state.
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.working.users.get(&id).map(|(user, _)| user.clone()))
    }

    async fn find_user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .working
            .users
            .values()
            .find(|(user, _)| &user.email == email)
            .map(|(user, _)| user.clone()))
    }

    async fn find_login(
        &mut self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .working
            .users
            .values()
            .find(|(user, _)| &user.email == email)
            .cloned())
    }

    async fn insert_user(&mut self, new: &NewUser) -> Result<User, RepositoryError> {
        if self.find_user_by_email(&new.email).await?.is_some() {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(self.working.next_id()),
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            role: UserRole::Customer,
            created_at: now,
            updated_at: now,
        };
        self.working
            .users
            .insert(user.id, (user.clone(), new.password_hash.clone()));
        Ok(user)
    }

    async fn set_user_role(&mut self, id: UserId, role: UserRole) -> Result<(), RepositoryError> {
        let (user, _) = self
            .working
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        user.role = role;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn count_users(&mut self) -> Result<i64, RepositoryError> {
        Ok(i64::try_from(self.working.users.len()).unwrap_or(i64::MAX))
    }

    async fn count_users_since(&mut self, since: DateTime<Utc>) -> Result<i64, RepositoryError> {
        let n = self
            .working
            .users
            .values()
            .filter(|(user, _)| user.created_at >= since)
            .count();
        Ok(i64::try_from(n).unwrap_or(i64::MAX))
    }

    async fn update_user_profile(
        &mut self,
        id: UserId,
        name: &str,
        phone: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let (user, _) = self
            .working
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        name.clone_into(&mut user.name);
        user.phone = phone.map(str::to_owned);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn password_hash(&mut self, id: UserId) -> Result<Option<String>, RepositoryError> {
        Ok(self.working.users.get(&id).map(|(_, hash)| hash.clone()))
    }

    async fn set_password_hash(&mut self, id: UserId, hash: &str) -> Result<(), RepositoryError> {
        let (user, stored) = self
            .working
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        hash.clone_into(stored);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_address(
        &mut self,
        user_id: UserId,
        address: &DeliveryAddress,
    ) -> Result<Address, RepositoryError> {
        Ok(self.working.new_address(user_id, address, false))
    }

    async fn saved_addresses(&mut self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        Ok(self
            .working
            .addresses
            .values()
            .filter(|address| address.is_saved && address.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_saved_address(
        &mut self,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        Ok(self
            .working
            .addresses
            .get(&id)
            .filter(|address| address.is_saved)
            .cloned())
    }

    async fn insert_saved_address(
        &mut self,
        user_id: UserId,
        address: &DeliveryAddress,
    ) -> Result<Address, RepositoryError> {
        Ok(self.working.new_address(user_id, address, true))
    }

    async fn update_saved_address(
        &mut self,
        id: AddressId,
        fields: &DeliveryAddress,
    ) -> Result<Address, RepositoryError> {
        let address = self.working.saved_address_mut(id)?;
        address.street.clone_from(&fields.street);
        address.city.clone_from(&fields.city);
        address.state.clone_from(&fields.state);
        address.country.clone_from(&fields.country);
        address.pincode.clone_from(&fields.pincode);
        Ok(address.clone())
    }

    async fn set_default_address(
        &mut self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<(), RepositoryError> {
        if self.working.saved_address_mut(id)?.user_id != user_id {
            return Err(RepositoryError::NotFound);
        }
        for address in self
            .working
            .addresses
            .values_mut()
            .filter(|address| address.is_saved && address.user_id == user_id)
        {
            address.is_default = address.id == id;
        }
        Ok(())
    }

    async fn delete_saved_address(&mut self, id: AddressId) -> Result<(), RepositoryError> {
        self.working.saved_address_mut(id)?;
        self.working.addresses.remove(&id);
        Ok(())
    }

    async fn find_painting(&mut self, id: PaintingId) -> Result<Option<Painting>, RepositoryError> {
        Ok(self.working.paintings.get(&id).cloned())
    }

    async fn lock_paintings(
        &mut self,
        ids: &[PaintingId],
    ) -> Result<Vec<Painting>, RepositoryError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .iter()
            .filter_map(|id| self.working.paintings.get(id).cloned())
            .collect())
    }

    async fn search_paintings(
        &mut self,
        query: &PaintingQuery,
    ) -> Result<Page<Painting>, RepositoryError> {
        let mut matching: Vec<Painting> = self
            .working
            .paintings
            .values()
            .filter(|painting| query.matches(painting))
            .cloned()
            .collect();

        match query.sort {
            PaintingSort::Newest => {
                matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            }
            PaintingSort::PriceAsc => {
                matching.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id)));
            }
            PaintingSort::PriceDesc => {
                matching.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id)));
            }
            PaintingSort::Popular => matching.sort_by(|a, b| {
                b.purchase_count
                    .cmp(&a.purchase_count)
                    .then(b.view_count.cmp(&a.view_count))
                    .then(a.id.cmp(&b.id))
            }),
        }

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        Ok(Page::new(query.page.apply(matching), query.page, total))
    }

    async fn insert_painting(&mut self, draft: &PaintingDraft) -> Result<Painting, RepositoryError> {
        let now = Utc::now();
        let painting = Painting {
            id: PaintingId::new(self.working.next_id()),
            title: draft.title.clone(),
            artist_name: draft.artist_name.clone(),
            description: draft.description.clone(),
            medium: draft.medium.clone(),
            height_cm: draft.height_cm,
            width_cm: draft.width_cm,
            depth_cm: draft.depth_cm,
            year_created: draft.year_created,
            price: draft.price,
            currency: CurrencyCode::INR,
            stock_quantity: draft.stock_quantity,
            is_available: draft.is_available,
            view_count: 0,
            purchase_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.working.paintings.insert(painting.id, painting.clone());
        Ok(painting)
    }

    async fn update_painting(
        &mut self,
        id: PaintingId,
        draft: &PaintingDraft,
    ) -> Result<Painting, RepositoryError> {
        let painting = self.working.painting_mut(id)?;
        painting.title.clone_from(&draft.title);
        painting.artist_name.clone_from(&draft.artist_name);
        painting.description.clone_from(&draft.description);
        painting.medium.clone_from(&draft.medium);
        painting.height_cm = draft.height_cm;
        painting.width_cm = draft.width_cm;
        painting.depth_cm = draft.depth_cm;
        painting.year_created = draft.year_created;
        painting.price = draft.price;
        painting.stock_quantity = draft.stock_quantity;
        painting.is_available = draft.is_available;
        painting.updated_at = Utc::now();
        Ok(painting.clone())
    }

    async fn set_painting_available(
        &mut self,
        id: PaintingId,
        available: bool,
    ) -> Result<(), RepositoryError> {
        let painting = self.working.painting_mut(id)?;
        painting.is_available = available;
        painting.updated_at = Utc::now();
        Ok(())
    }

    async fn record_sale(&mut self, id: PaintingId, quantity: i32) -> Result<(), RepositoryError> {
        if self.working.failing_sale == Some(id) {
            return Err(RepositoryError::DataCorruption(format!(
                "injected failure updating stock of painting {id}"
            )));
        }
        let painting = self.working.painting_mut(id)?;
        let remaining = painting.stock_quantity - quantity;
        if remaining < 0 {
            // Mirrors the CHECK constraint on paintings.stock_quantity
            return Err(RepositoryError::Conflict(format!(
                "stock of painting {id} would go negative"
            )));
        }
        painting.stock_quantity = remaining;
        if remaining == 0 {
            painting.is_available = false;
        }
        painting.purchase_count += i64::from(quantity);
        painting.updated_at = Utc::now();
        Ok(())
    }

    async fn restock(&mut self, id: PaintingId, quantity: i32) -> Result<(), RepositoryError> {
        let painting = self.working.painting_mut(id)?;
        painting.stock_quantity += quantity;
        painting.is_available = true;
        painting.updated_at = Utc::now();
        Ok(())
    }

    async fn increment_view_count(&mut self, id: PaintingId) -> Result<(), RepositoryError> {
        self.working.painting_mut(id)?.view_count += 1;
        Ok(())
    }

    async fn painting_stats(&mut self) -> Result<PaintingStats, RepositoryError> {
        let count = |f: &dyn Fn(&Painting) -> bool| {
            let n = self.working.paintings.values().filter(|p| f(p)).count();
            i64::try_from(n).unwrap_or(i64::MAX)
        };
        Ok(PaintingStats::new(count(&|_| true), count(&|p| p.is_available)))
    }

    async fn top_paintings(
        &mut self,
        rank: PaintingRank,
        limit: i64,
    ) -> Result<Vec<Painting>, RepositoryError> {
        let mut ranked: Vec<Painting> = self
            .working
            .paintings
            .values()
            .filter(|painting| painting.is_available)
            .cloned()
            .collect();
        ranked.sort_by(|a, b| rank.score(b).cmp(&rank.score(a)).then(a.id.cmp(&b.id)));
        ranked.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(ranked)
    }

    async fn find_cart(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self
            .working
            .carts
            .values()
            .find(|cart| cart.user_id == user_id)
            .cloned())
    }

    async fn lock_cart(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        self.find_cart(user_id).await
    }

    async fn insert_cart(&mut self, user_id: UserId) -> Result<Cart, RepositoryError> {
        if self.find_cart(user_id).await?.is_some() {
            return Err(RepositoryError::Conflict("cart already exists".to_owned()));
        }
        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(self.working.next_id()),
            user_id,
            created_at: now,
            updated_at: now,
        };
        self.working.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn cart_items(&mut self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(self
            .working
            .cart_items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .cloned()
            .collect())
    }

    async fn find_cart_item(
        &mut self,
        id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self.working.cart_items.get(&id).cloned())
    }

    async fn insert_cart_item(
        &mut self,
        cart_id: CartId,
        painting_id: PaintingId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let duplicate = self
            .working
            .cart_items
            .values()
            .any(|item| item.cart_id == cart_id && item.painting_id == painting_id);
        if duplicate {
            return Err(RepositoryError::Conflict(
                "painting already in cart".to_owned(),
            ));
        }
        let item = CartItem {
            id: CartItemId::new(self.working.next_id()),
            cart_id,
            painting_id,
            quantity,
            added_at: Utc::now(),
        };
        self.working.cart_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn set_cart_item_quantity(
        &mut self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        self.working
            .cart_items
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?
            .quantity = quantity;
        Ok(())
    }

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<(), RepositoryError> {
        self.working
            .cart_items
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let before = self.working.cart_items.len();
        self.working
            .cart_items
            .retain(|_, item| item.cart_id != cart_id);
        Ok(u64::try_from(before - self.working.cart_items.len()).unwrap_or(u64::MAX))
    }

    async fn wishlist_items(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let mut items: Vec<WishlistItem> = self
            .working
            .wishlist
            .values()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn find_wishlist_item(
        &mut self,
        id: WishlistItemId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        Ok(self.working.wishlist.get(&id).cloned())
    }

    async fn find_wishlist_entry(
        &mut self,
        user_id: UserId,
        painting_id: PaintingId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        Ok(self
            .working
            .wishlist
            .values()
            .find(|item| item.user_id == user_id && item.painting_id == painting_id)
            .cloned())
    }

    async fn insert_wishlist_item(
        &mut self,
        user_id: UserId,
        painting_id: PaintingId,
    ) -> Result<WishlistItem, RepositoryError> {
        if self.find_wishlist_entry(user_id, painting_id).await?.is_some() {
            return Err(RepositoryError::Conflict(
                "painting already in wishlist".to_owned(),
            ));
        }
        let item = WishlistItem {
            id: WishlistItemId::new(self.working.next_id()),
            user_id,
            painting_id,
            added_at: Utc::now(),
        };
        self.working.wishlist.insert(item.id, item.clone());
        Ok(item)
    }

    async fn delete_wishlist_item(&mut self, id: WishlistItemId) -> Result<(), RepositoryError> {
        self.working
            .wishlist
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn clear_wishlist(&mut self, user_id: UserId) -> Result<u64, RepositoryError> {
        let before = self.working.wishlist.len();
        self.working.wishlist.retain(|_, item| item.user_id != user_id);
        Ok(u64::try_from(before - self.working.wishlist.len()).unwrap_or(u64::MAX))
    }

    async fn count_wishlist(&mut self, user_id: UserId) -> Result<i64, RepositoryError> {
        let n = self
            .working
            .wishlist
            .values()
            .filter(|item| item.user_id == user_id)
            .count();
        Ok(i64::try_from(n).unwrap_or(i64::MAX))
    }

    async fn order_number_exists(
        &mut self,
        number: &OrderNumber,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .working
            .orders
            .values()
            .any(|order| &order.order_number == number))
    }

    async fn insert_order(
        &mut self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        if self.order_number_exists(&order.order_number).await? {
            return Err(RepositoryError::Conflict(
                "order number already exists".to_owned(),
            ));
        }
        let now = Utc::now();
        let stored = StoredOrder {
            id: OrderId::new(self.working.next_id()),
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            total_amount: order.total_amount,
            currency: order.currency,
            delivery_address_id: order.delivery_address_id,
            status: order.status,
            payment_method: order.payment_method,
            tracking_info: None,
            notes: order.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        for item in items {
            let item = OrderItem {
                id: OrderItemId::new(self.working.next_id()),
                order_id: stored.id,
                painting_id: item.painting_id,
                quantity: item.quantity,
                price_at_purchase: item.price_at_purchase,
                painting_title: item.painting_title.clone(),
                artist_name: item.artist_name.clone(),
            };
            self.working.order_items.insert(item.id, item);
        }
        let order = self.working.order(&stored)?;
        self.working.orders.insert(stored.id, stored);
        Ok(order)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.working
            .orders
            .get(&id)
            .map(|stored| self.working.order(stored))
            .transpose()
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.find_order(id).await
    }

    async fn list_user_orders(
        &mut self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let state = &self.working;
        state.order_page(
            state.orders.values().filter(|order| order.user_id == user_id),
            page,
        )
    }

    async fn list_orders(
        &mut self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let state = &self.working;
        state.order_page(
            state
                .orders
                .values()
                .filter(|order| status.is_none_or(|s| order.status == s)),
            page,
        )
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        tracking_info: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let order = self
            .working
            .orders
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        if let Some(tracking) = tracking_info {
            order.tracking_info = Some(tracking.to_owned());
        }
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn order_stats(&mut self) -> Result<OrderStats, RepositoryError> {
        let mut stats = OrderStats::default();
        for order in self.working.orders.values() {
            stats.record(order.status, order.total_amount, 1);
        }
        Ok(stats)
    }

    async fn revenue_since(&mut self, since: DateTime<Utc>) -> Result<Decimal, RepositoryError> {
        Ok(self
            .working
            .orders
            .values()
            .filter(|order| order.status != OrderStatus::Cancelled && order.created_at >= since)
            .map(|order| order.total_amount)
            .sum())
    }

    async fn monthly_revenue(
        &mut self,
        months: i64,
    ) -> Result<Vec<MonthlyRevenue>, RepositoryError> {
        let mut by_month: BTreeMap<(i32, u32), (Decimal, i64)> = BTreeMap::new();
        for order in self
            .working
            .orders
            .values()
            .filter(|order| order.status != OrderStatus::Cancelled)
        {
            let entry = by_month
                .entry((order.created_at.year(), order.created_at.month()))
                .or_default();
            entry.0 += order.total_amount;
            entry.1 += 1;
        }
        Ok(by_month
            .into_iter()
            .rev()
            .take(usize::try_from(months).unwrap_or(0))
            .map(|((year, month), (revenue, count))| {
                MonthlyRevenue::new(year, month, revenue, count)
            })
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
