pub mod keygen;
pub mod send;
pub mod show;

mod inbound;
pub use inbound::{LogErrorReporter, LogInboundHandler};
