//! Services layer - Business logic
//!
//! Services implement the account, session, team and fitness operations on
//! top of the repositories. Authorization decisions live in [`authz`] as pure
//! functions; services call them before touching the store.

pub mod authz;
pub mod fitness;
pub mod password;
pub mod session;
pub mod team;
pub mod user;

pub use authz::AccessDenied;
pub use fitness::{FitnessService, FitnessServiceError};
pub use password::{hash_password, verify_password};
pub use session::{generate_session_key, SessionError, SessionManager};
pub use team::{TeamService, TeamServiceError};
pub use user::{is_valid_email, UserService, UserServiceError};
