pub mod dispatcher;
pub mod lock_bank;

pub use dispatcher::Dispatcher;
pub use lock_bank::{LockBank, STRIPES};
