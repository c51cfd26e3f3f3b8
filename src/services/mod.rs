pub mod checkout;

pub use checkout::{CartItem, CheckoutError, CheckoutReceipt, CheckoutService};
