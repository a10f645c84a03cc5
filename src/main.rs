use stress_test::{stress_test_scaling, stress_test_text, stress_test_writers};
pub mod stress_test;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    rt.block_on(async_main());
}

async fn async_main() {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            DOCUMENT STORE STRESS TESTS                      ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: few writers
    let stats = stress_test_writers(4, 100).await;
    stats.print();

    // Test 2: many writers
    let stats = stress_test_writers(16, 500).await;
    stats.print();

    // Test 3: text reconciliation
    let stats = stress_test_text(1000).await;
    stats.print();

    // Test 4: scaling analysis
    stress_test_scaling(20, 4).await;

    println!("\n✓ All stress tests completed");
}
