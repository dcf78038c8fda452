// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, password reset and liveness.

pub mod login;
pub mod utils;

pub use login::{login_access_token, reset_password, LoginForm, NewPassword, Token};
pub use utils::health_check;
