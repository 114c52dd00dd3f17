use idv_gateway::infra::config::AppConfig;
use idv_gateway::infra::didit::{DiditClient, VerificationProvider};
use idv_gateway::infra::logging;
use idv_gateway::storage::{PostgresStore, VerificationStore};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--probe-session <session_id>]\n\
         \n\
         Requires env vars:\n\
           DIDIT_API_KEY, DIDIT_WORKFLOW_ID, DIDIT_WEBHOOK_SECRET\n\
         Optional:\n\
           DIDIT_BASE_URL, DIDIT_CALLBACK_URL, DATABASE_URL, BIND_ADDR, WEBHOOK_TOLERANCE_SECS\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("warn")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let probe_session = args
        .iter()
        .position(|a| a == "--probe-session")
        .map(|i| args.get(i + 1).cloned().unwrap_or_else(|| usage_and_exit()));

    // Force-read config (nice error messages if missing)
    let config = AppConfig::from_env()?;

    println!("> Preflight:");
    println!("  DIDIT_BASE_URL={}", config.didit.base_url);
    println!("  DIDIT_WORKFLOW_ID={}", config.didit.workflow_id);
    println!(
        "  DIDIT_CALLBACK_URL={}",
        config.didit.callback_url.as_deref().unwrap_or("<unset>")
    );
    println!("  WEBHOOK_TOLERANCE_SECS={}", config.webhook_tolerance_secs);
    println!("  BIND_ADDR={}", config.bind_addr);

    match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url).await?;
            store.ping().await?;
            println!("  Database: reachable, tables ensured");
        }
        None => println!("  Database: DATABASE_URL unset, the server will use the in-memory store"),
    }

    let client = DiditClient::new(&config.didit)?;
    if let Some(session_id) = probe_session {
        // A decision lookup proves both reachability and that the API key is accepted.
        let decision = client.session_decision(&session_id).await?;
        println!("  Vendor: session {} is '{}'", decision.session_id, decision.status);
    } else {
        println!("  Vendor: skipped (pass --probe-session <id> to check credentials)");
    }

    println!("> Preflight OK");
    Ok(())
}
