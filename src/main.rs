#[tokio::main]
async fn main() {
    if let Err(e) = prescription_intake_lib::run().await {
        eprintln!("prescription-intake: {e}");
        std::process::exit(1);
    }
}
