//! Process runtime support.
//!
//! # Data Flow
//! ```text
//! context.rs: WalletConfig ──→ NodeClient + KeyringSigner + AddressBook + PasswordGate
//! signals.rs: SIGTERM / Ctrl-C ──→ Shutdown::trigger
//! shutdown.rs: watch flag ──→ bridge listener loop, stdio reader, main
//! ```

pub mod context;
pub mod shutdown;
pub mod signals;

pub use context::WalletContext;
pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::spawn_signal_handler;
