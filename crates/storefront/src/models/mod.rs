//! Domain models for the gallery.
//!
//! These are fully materialized rows: loading an order loads its items and
//! address in the same call, never lazily.

pub mod address;
pub mod cart;
pub mod order;
pub mod page;
pub mod painting;
pub mod session;
pub mod user;
pub mod wishlist;

pub use address::{Address, DeliveryAddress};
pub use cart::{Cart, CartItem, CartLine, CartView};
pub use order::{
    AdminContact, CheckoutRequest, MonthlyRevenue, NewOrder, NewOrderItem, Order, OrderDetails,
    OrderItem, OrderItemView, OrderStats,
};
pub use page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest};
pub use painting::{
    Painting, PaintingDraft, PaintingQuery, PaintingRank, PaintingSort, PaintingStats,
    PopularPainting,
};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User};
pub use wishlist::{WishlistEntry, WishlistItem, WishlistView};
