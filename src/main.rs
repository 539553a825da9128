mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod provider;
mod scheduler;
mod server;
mod store;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
