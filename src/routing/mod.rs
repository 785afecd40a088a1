//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     Resource::crud / to_one / to_many / action
//!     → table.rs (append Route + handler, allowed or not)
//!     → matcher.rs (compile pattern)
//!
//! Incoming request (method, path relative to the API prefix):
//!     → table.rs (lookup)
//!     → matcher.rs (structural match, capture :id)
//!     → Found / MethodNotRegistered / NoMatch
//! ```
//!
//! # Design Decisions
//! - Tables are built at startup and immutable at runtime
//! - No regex in the hot path
//! - First registered route for a method wins
//! - `Allow` is computed from the table on every request, never cached

pub mod disallow;
pub mod matcher;
pub mod table;

pub use disallow::{Disallow, DisallowError};
pub use matcher::{PathParams, PathPattern};
pub use table::{Lookup, Route, RouteTable};
