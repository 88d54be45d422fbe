//! Git collaborator: subprocess executor, HEAD capture, and push targets.

pub mod executor;
pub mod head;
pub mod ops;
pub mod remote;

pub use executor::{GitExecutor, SystemGit};
pub use head::{HeadState, capture_head_state};
pub use ops::AddTarget;
pub use remote::{RemoteSync, resolve_remote_sync};
