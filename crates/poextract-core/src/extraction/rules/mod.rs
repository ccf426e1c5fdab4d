//! Field normalization rules for purchase orders.

pub mod abn;
pub mod address;
pub mod message;
pub mod numeric;
pub mod patterns;

pub use abn::{format_abn, normalize_abn, validate_abn};
pub use address::{split_address, AddressSplitter};
pub use message::{extract_emails, extract_order_notes};
pub use numeric::extract_numeric;
