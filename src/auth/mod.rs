//! Account credentials and session token handling.

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password};
pub use session::{SESSION_COOKIE, build_session_cookie, clear_session_cookie, new_session_token, session_expiry};
