use clap::Parser;
use pairing_worker::config::WorkerArgs;
use pairing_worker::drain::run_drain;
use pairing_worker::logging::init_tracing;
use pairing_worker::runtime::load_runtime_dependencies;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = WorkerArgs::parse();
    let settings = args.drain_settings()?;
    let deps = load_runtime_dependencies(&args).await?;

    let report = run_drain(deps.pairing(), &settings).await?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
