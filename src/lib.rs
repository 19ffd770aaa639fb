pub mod config;
pub mod error;
pub mod policy;
pub mod unsealer;
pub mod utils;
pub mod vault;

pub use error::{BackendError, Error, PolicyLoadError};
pub use policy::{Policy, PolicyStore};
pub use unsealer::Unsealer;
pub use vault::VaultClient;
