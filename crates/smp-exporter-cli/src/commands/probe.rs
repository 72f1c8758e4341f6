use anyhow::Context;
use smp_exporter_core::ModelRegistry;
use smp_exporter_server::{ClientConfig, DeviceClient, probe_target};

pub fn run(target: &str, authorization: Option<&str>, config: &ClientConfig) -> anyhow::Result<()> {
    let registry = ModelRegistry::builtin().context("invalid built-in model tables")?;
    let client = DeviceClient::new(config)?;

    let rt = super::runtime()?;
    let output = rt
        .block_on(probe_target(&registry, &client, target, authorization))
        .with_context(|| format!("probe of {target} failed"))?;

    log::info!(
        "{} ({}) at {:?}: {} readings",
        output.report.unit.name,
        output.report.model,
        output.report.unit.location,
        output.report.readings.len()
    );
    print!("{}", output.body);
    Ok(())
}
