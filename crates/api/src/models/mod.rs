//! Domain models for Hexshop.
//!
//! These types represent validated domain objects, separate from the
//! database row types in [`crate::db`] and the request bodies in
//! [`crate::routes`].

pub mod category;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use category::{Category, CategoryInput};
pub use order::{NewOrder, Order, OrderDraft, OrderLine, OrderStatusChange};
pub use product::{Product, ProductInput};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User};
