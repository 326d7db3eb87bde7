use actix_web::web::Data;

use mentor_slots::ledger::SlotLedger;
use mentor_slots::web::{start_server, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args: Vec<String> = std::env::args().collect();
    let port = args
        .get(1)
        .and_then(|p| p.parse::<u16>().ok())
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(8080);

    let ledger = match std::env::var("MENTOR_SLOTS_SNAPSHOT") {
        Ok(path) => {
            println!("Loading ledger snapshot from {}", path);
            SlotLedger::with_snapshot(path.into())?
        }
        Err(_) => SlotLedger::new(),
    };

    println!("Starting mentorship API on port {}...", port);
    println!("Access the API at http://localhost:{}/api/health", port);

    start_server(port, Data::new(AppState::new(ledger))).await?;
    Ok(())
}
