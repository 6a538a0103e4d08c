use anyhow::Result;
use warden::cli::{self, actions, actions::Action};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;

    match action {
        Action::Server(args) => actions::server::execute(args).await?,
    }

    Ok(())
}
