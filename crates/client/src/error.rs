//! Error types surfaced by the Stormdesk client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while talking to the platform.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered outside the success set for the verb, after any
    /// re-authentication replay was already spent.
    #[error("request failed: {status}: {body}")]
    RequestFailed {
        /// HTTP status returned by the server.
        status: StatusCode,
        /// Response body, typically a JSON error document.
        body: String,
    },

    /// A rejected session could not be re-established.
    #[error("re-authentication failed")]
    Unauthenticated(#[source] Box<Error>),

    /// The account does not belong to any organization.
    #[error("user is not a member of any organization")]
    NoOrganizationMembership,

    /// The requested organization is not among the account's memberships.
    #[error(
        "user is not a member of organization '{requested}'; available organizations: {}",
        .available.join(", ")
    )]
    OrganizationNotFound {
        /// Organization name that was asked for.
        requested: String,
        /// Names the account actually belongs to.
        available: Vec<String>,
    },

    /// No organization was named and the account belongs to several.
    #[error(
        "no organization specified; user is a member of: {}",
        .available.join(", ")
    )]
    OrganizationNotSpecified {
        /// Names the account belongs to.
        available: Vec<String>,
    },

    /// The organization exists but has been disabled for this account.
    #[error("organization '{name}' is not accessible to this account")]
    OrganizationDisabled {
        /// Name of the disabled organization.
        name: String,
    },

    /// An optimistic update gave up under a bounded [`ConflictPolicy`](crate::ConflictPolicy).
    #[error("update abandoned after {attempts} conflicting attempts")]
    ConflictExhausted {
        /// Number of full fetch/apply/put cycles that were tried.
        attempts: u32,
    },

    /// The login response was missing pieces the client depends on.
    #[error("malformed session response: {0}")]
    MalformedSession(String),

    /// The connection settings could not be turned into a working HTTP client.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection-level failure from the HTTP stack.
    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    /// Local file access failed, e.g. while reading an attachment.
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status attached to this error, when there is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Unauthenticated(inner) => inner.status(),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_errors_enumerate_memberships() {
        let err = Error::OrganizationNotFound {
            requested: "Ops".to_string(),
            available: vec!["Alpha".to_string(), "Beta".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "user is not a member of organization 'Ops'; available organizations: Alpha, Beta"
        );

        let err = Error::OrganizationNotSpecified {
            available: vec!["Alpha".to_string(), "Beta".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no organization specified; user is a member of: Alpha, Beta"
        );
    }

    #[test]
    fn status_is_exposed_through_reauth_wrapper() {
        let inner = Error::RequestFailed {
            status: StatusCode::FORBIDDEN,
            body: "{}".to_string(),
        };
        let err = Error::Unauthenticated(Box::new(inner));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    }
}
