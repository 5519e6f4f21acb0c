use simulation::{simulate_marketplace, simulate_offline_resync};
use tracing_subscriber::EnvFilter;
pub mod simulation;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
    rt.block_on(async_main());
}

async fn async_main() {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            LECTERN SYNC SIMULATIONS                        ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Small marketplace: everything should converge quickly.
    let stats = simulate_marketplace(2, 4, 3).await;
    stats.print();

    // Larger fleet.
    let stats = simulate_marketplace(4, 10, 5).await;
    stats.print();

    // Offline fallback and resync behavior.
    simulate_offline_resync().await;

    println!("\n✓ All simulations completed!");
}
