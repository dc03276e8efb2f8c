// HTTP endpoints: subscription handshake and message delivery

mod signature;
mod webhook;

pub use signature::SignatureVerifier;
pub use webhook::{create_router, AppState};
