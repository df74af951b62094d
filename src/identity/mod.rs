//! Identity lifecycle: who a user is, how they prove it, and how a session
//! carries that proof between requests.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod credentials;
mod token;
mod session;
mod guard;

pub use principal::Principal;
pub use credentials::{CredentialError, CredentialStore, Identity, MemoryUserRepository, UserRepository};
pub use token::{Token, TokenError, TokenService};
pub use session::{new_session_id, SessionBinding, SessionId, SessionRegistry};
pub use guard::{AuthorizationGuard, GuardError};
