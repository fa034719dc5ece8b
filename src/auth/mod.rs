//! Guards the app behind a single admin password.
//!
//! Logging in stores an encrypted session token in a private cookie. The
//! token carries a fingerprint of the stored password hash, so setting a new
//! password ends every session.

mod admin;
mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod token;

pub use admin::{create_admin_table, get_password_hash, set_password_hash};
pub use cookie::{
    DEFAULT_COOKIE_DURATION, get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::{build_log_in_redirect_url, default_redirect_url, normalize_redirect_url};
pub(super) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub use middleware::AuthState;
