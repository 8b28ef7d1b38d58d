mod transport;
pub use transport::Transport;

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
