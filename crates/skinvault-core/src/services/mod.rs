//! Services shared by every skinvault interface

mod replica;
mod session;

pub use replica::ReplicaService;
pub use session::SyncSession;
