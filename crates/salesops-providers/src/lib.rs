//! Outbound HTTP adapters.
//!
//! [`PostgrestStore`] reads the hosted sales tables through their REST
//! interface and implements [`salesops_core::store::SalesStore`].
//! [`ZoomPhoneClient`] reads call logs and the caller directory and implements
//! [`salesops_core::call_log::CallLogSource`]. Both share one reqwest client
//! setup and the same [`RetryPolicy`].

mod http;

pub mod error;
pub mod postgrest;
pub mod retry;
pub mod zoom;

pub use error::{ProviderError, Result};
pub use postgrest::{PostgrestConfig, PostgrestStore};
pub use retry::RetryPolicy;
pub use zoom::{ZoomPhoneClient, ZoomPhoneConfig};
