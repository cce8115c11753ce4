//! Authentication
//!
//! - [`TokenProvider`] - supplies a currently valid access token
//! - [`TokenFactory`] - obtains tokens from the `/oauth/token` endpoint and
//!   refreshes them shortly before they expire
//! - [`Credentials`] - form data sent to the token endpoint

mod credentials;
mod factory;
mod mask;
mod token;

pub use credentials::Credentials;
pub use credentials::DEFAULT_SCOPE;
pub use factory::Clock;
pub use factory::DEFAULT_TOKEN_PATH;
pub use factory::TokenFactory;
pub use mask::mask_secrets;
pub use token::AccessToken;
pub use token::EXPIRY_MARGIN_SECS;
pub use token::StaticTokenProvider;
pub use token::TokenProvider;
