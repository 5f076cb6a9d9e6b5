//! HashiCorp Vault client core.
//!
//! Provides the layer every Vault feature is built on: authenticated HTTP
//! dispatch, response envelope parsing, error classification, name/path
//! addressing, and the token session with its login state machine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod login;
pub mod path;
pub mod response;
pub mod session;
pub mod telemetry;
pub mod token;
pub mod transport;

pub use client::VaultClient;
pub use config::VaultConfig;
pub use error::{InvalidDataCode, VaultError, VaultResult};
pub use login::{
    AppRoleLogin, ConnectionState, LdapLogin, LoginConnector, LoginMethod, LoginResponse,
    TokenLogin, UserPassLogin,
};
pub use path::Address;
pub use response::{OneOrMany, VaultResponse};
pub use session::TokenSession;
pub use token::{Token, TokenType};
pub use transport::{HttpTransport, Params};
