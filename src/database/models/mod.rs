pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
pub use product::{NewProduct, Product};
pub use user::{NewUser, User};
