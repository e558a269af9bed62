mod cli;
use anyhow::Result;
use cli::handler::handle_cli;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    handle_cli()
}
