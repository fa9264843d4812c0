//! Domain models for the StepUp backend.
//!
//! These are the records the stores persist and the handlers serialize.
//! Row types used only for decoding live next to the Postgres queries.

pub mod cart;
pub mod checkout;
pub mod payment;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, CartView};
pub use checkout::Checkout;
pub use payment::Payment;
pub use product::{Product, ProductInput};
pub use user::User;
