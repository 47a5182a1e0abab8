//! Shared test fixtures for the engine workspace.
//!
//! - [`FragmentTree`]: a throwaway configuration root on disk
//! - [`InMemoryDirectory`]: an `EntityLookup` with failure injection
//! - Small constructors for users, employees and memberships

mod directory;
mod fixtures;

pub use directory::*;
pub use fixtures::*;
