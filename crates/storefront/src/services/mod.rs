//! Business logic services.
//!
//! Each service borrows the shared [`Store`](crate::db::Store) and runs every
//! call as one unit of work.
//!
//! - `auth` - Registration and password login
//! - `users` - Profile, password changes and saved addresses
//! - `catalog` - Public painting listing and detail
//! - `cart` - Per-user cart
//! - `wishlist` - Saved paintings
//! - `orders` - Checkout, cancellation, lookup and admin status changes
//! - `admin` - Dashboard figures and catalogue maintenance
//! - `notify` - Order confirmation and welcome email delivery

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod notify;
pub mod orders;
pub mod users;
pub mod wishlist;
