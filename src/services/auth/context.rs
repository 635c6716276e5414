//! Per-request authentication outcome.
//!
//! The bearer middleware writes exactly one `SecurityContext` into the request
//! extensions; handlers read it through the `CurrentUser` extractor. It is
//! dropped with the request and never shared between requests.
use std::net::IpAddr;

use crate::services::auth::identity::Identity;

/// Request metadata kept alongside an authenticated principal for audit correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDetails {
    pub client_ip: Option<IpAddr>,
    pub request_id: Option<String>,
}

/// An identity that presented a valid token on this request.
#[derive(Clone)]
pub struct Principal {
    pub identity: Identity,
    /// The raw bearer token that proved the identity.
    credentials: String,
    pub details: RequestDetails,
}

impl Principal {
    pub fn new(identity: Identity, credentials: impl Into<String>, details: RequestDetails) -> Self {
        Self {
            identity,
            credentials: credentials.into(),
            details,
        }
    }

    pub fn username(&self) -> &str {
        &self.identity.subject
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.identity.has_role(role)
    }

    pub fn credentials(&self) -> &str {
        &self.credentials
    }
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the bearer token
        f.debug_struct("Principal")
            .field("identity", &self.identity)
            .field("details", &self.details)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub enum SecurityContext {
    #[default]
    Anonymous,
    Authenticated(Principal),
}

impl SecurityContext {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(p) => Some(p),
            Self::Anonymous => None,
        }
    }
}
