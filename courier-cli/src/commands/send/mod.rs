mod handler;

use clap::Args;

pub use handler::handle_commands as send_handler;

/// Sends one message over a stored connection
#[derive(Args, Clone)]
pub struct SendArgs {
    #[arg(short, long, value_name = "FILE")]
    pub record: String,

    /// Message as a JSON object
    #[arg(short, long)]
    pub message: String,

    /// Transport settings, defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Don't ask the partner to answer on the same request
    #[arg(long, default_value_t = false)]
    pub no_return_route: bool,

    /// How long to wait for socket replies before closing
    #[arg(long, default_value_t = 5)]
    pub wait_secs: u64,
}
