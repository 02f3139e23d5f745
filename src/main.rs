#[tokio::main]
async fn main() {
    if let Err(e) = wallet_fingerprinting::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
