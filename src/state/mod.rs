/// State management module
///
/// This module handles all workflow state, including:
/// - Shared data structures (data.rs)
/// - The session root and its guards (session.rs)
/// - The intent reducer and AI call contract (reducer.rs)
/// - The finals collection (finals.rs)

pub mod data;
pub mod finals;
pub mod reducer;
pub mod session;

pub use reducer::Intent;
pub use session::Session;
