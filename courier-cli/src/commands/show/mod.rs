mod handler;

use clap::Args;

pub use handler::handle_commands as show_handler;

/// Prints what a stored connection resolves to
#[derive(Args, Clone)]
pub struct ShowArgs {
    #[arg(short, long, value_name = "FILE")]
    pub record: String,
}
