//! Remote image loading: the loader seam, cancel handles and a threaded
//! implementation for local files.

pub mod cancel;
pub mod remote;
pub mod threaded;

pub use cancel::{CancelFlag, CancelHandle};
pub use remote::{LoadCallback, NoRemoteLoader, RemoteLoader};
pub use threaded::ThreadedLoader;
