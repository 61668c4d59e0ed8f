mod remote;

pub use remote::{ReconcileOutcome, RemoteIdentity, RemoteStore};
