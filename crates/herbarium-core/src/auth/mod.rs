//! Identity, session context, and the admin gate.

pub mod gate;
pub mod identity;
pub mod session;

pub use gate::{check_admin, complete_sign_in, AccessDecision, AdminUser, CallbackOutcome};
pub use identity::{HostedIdentity, IdentityError, IdentityProvider, SessionUser, StaticIdentity};
pub use session::{AuthEvent, SessionContext, Subscription};

/// Cookie carrying the provider access token.
pub const SESSION_COOKIE: &str = "herbarium_session";
