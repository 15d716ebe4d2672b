//! Provider transports and payload normalization for newsdesk
//!
//! This crate provides the outbound side of the pipeline:
//! - Wire types for the supported content providers
//! - Normalization adapters mapping provider payloads onto the canonical
//!   `Item` shape, with quality filtering and identity-key derivation
//! - A `ProviderTransport` abstraction with a live HTTP implementation and
//!   a deterministic simulated one for credential-free runs

pub mod error;
pub mod fixtures;
pub mod normalize;
pub mod transport;
pub mod types;

pub use error::{FetchError, NormalizeError};
pub use fixtures::FixtureGenerator;
pub use normalize::{
    identity_key, normalizer_for, HeadlineHubNormalizer, NewsWireNormalizer, Normalizer,
    MIN_DESCRIPTION_LEN, MIN_TITLE_LEN,
};
pub use transport::{DataSource, HttpTransport, ProviderConfig, ProviderTransport};
pub use types::{ProviderRequest, Volatility, HEADLINE_HUB, NEWSWIRE};
