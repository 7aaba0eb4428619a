//! File storage implementations.

mod local;
mod memory;
mod ticket;

pub use local::LocalFileStorage;
pub use memory::MemoryFileStorage;
pub use ticket::TicketSigner;
