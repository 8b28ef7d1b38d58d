mod handler;

use clap::Args;

pub use handler::handle_commands as keygen_handler;

/// Creates a fresh connection for a partner and stores its record
#[derive(Args, Clone)]
pub struct KeygenArgs {
    /// Display name of the partner
    #[arg(short, long)]
    pub label: String,

    /// Partner's DID Doc, as a JSON file
    #[arg(short, long, value_name = "FILE")]
    pub doc: String,

    /// Where the connection record is written, printed when omitted
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<String>,
}
