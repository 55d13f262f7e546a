//! Session gate.
//!
//! Turns "someone is signed in with the identity service" into a rendering
//! decision for the admin panel:
//!
//! ```text
//! identity session ─► profile lookup ─► role ─► permission table
//!                                              ├─► filtered navigation
//!                                              └─► render / restricted per page
//! ```
//!
//! [`resolve`] performs one resolution pass. [`SessionGate`] keeps the result
//! current for as long as it is mounted, re-running the pass on every
//! auth-change notification from the identity provider.

mod resolve;
mod session_gate;
mod state;

pub use resolve::{STAMP_TIMEOUT, lookup_admin, resolve, resolve_profile, stamp_login};
pub use session_gate::{DEFAULT_RESOLVE_TIMEOUT, GateOptions, SessionGate};
pub use state::{AuthFailure, AuthState, GateSnapshot, PageAccess, PageDecision, page_access};
