mod credentials;
mod forward;
mod session;


pub use credentials::authenticate;
pub use forward::forward;
pub use session::ensure_token;
