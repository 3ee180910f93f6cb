//! Callback service: router and listener

mod router;
mod server;

pub use router::create_router;
pub use server::CallbackServer;
