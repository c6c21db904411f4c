pub mod jwt;
pub mod password;
pub mod text;

pub use jwt::encode_access_token;
pub use password::{hash_password, verify_password};
pub use text::{amount_from_cents, cents_from_amount, required_text};
