pub mod clock;
pub mod codec;
pub mod context;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod token_service;

pub use context::{Principal, RequestDetails, SecurityContext};
pub use credentials::CredentialAuthenticator;
pub use error::AuthError;
pub use identity::{CredentialStore, Identity, IdentityLookup, StoreError};
pub use pipeline::AuthenticationPipeline;
pub use token_service::TokenService;
