mod redacted;
pub mod session;
pub mod user;

pub use redacted::Redacted;
pub use session::SessionCookie;
pub use user::{Credentials, NewUser, Profile, User};
