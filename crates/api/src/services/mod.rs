//! Use-case services.
//!
//! # Services
//!
//! - `orders` - Order placement, status changes and deletion
//! - `catalog` - Category and product management
//! - `auth` - Registration, password login and profile updates
//!
//! Services only talk to storage through the traits in [`crate::ports`].

pub mod auth;
pub mod catalog;
pub mod orders;

pub use auth::{AuthError, AuthService, Registration};
pub use catalog::{CatalogError, CategoryService, ProductService};
pub use orders::{OrderError, OrderOptions, OrderService};
