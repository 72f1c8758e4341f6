use anyhow::Context;
use smp_exporter_server::ServerConfig;

pub fn run(config: ServerConfig) -> anyhow::Result<()> {
    let base = format!("http://{}", config.listen_address);

    println!("SMP Exporter v{}", smp_exporter_core::VERSION);
    println!("   {base}");
    println!();
    println!("   Endpoints:");
    println!("     GET /                   Index page");
    println!("     GET /probe?target=HOST  Probe one appliance");
    println!("     GET /metrics            Exporter self-metrics");
    println!("     GET /health             Health check");
    println!();
    println!(
        "   Device requests: {}s timeout, {}s connect, TLS verification {}",
        config.client.timeout.as_secs(),
        config.client.connect_timeout.as_secs(),
        if config.client.verify_tls { "on" } else { "off" }
    );
    println!();

    let rt = super::runtime()?;
    rt.block_on(smp_exporter_server::run_server(config))
        .context("exporter stopped")
}
