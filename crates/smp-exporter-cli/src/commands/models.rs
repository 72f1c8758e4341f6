use std::fmt::{self, Write};

use serde::Serialize;
use smp_exporter_core::{
    Correction, Extraction, Lexicon, MetricSpec, ModelDescriptor, ModelKey, ModelRegistry,
};

#[derive(Serialize)]
struct ModelEntry<'a> {
    model: ModelKey,
    default: bool,
    identities: &'static [&'static str],
    uris: &'static [&'static str],
    metrics: Vec<&'a MetricSpec>,
}

pub fn run(json: bool) -> anyhow::Result<()> {
    let registry = ModelRegistry::builtin()?;
    if json {
        println!("{}", render_json(&registry)?);
    } else {
        print!("{}", render_table(&registry)?);
    }
    Ok(())
}

fn entries(registry: &ModelRegistry) -> Vec<ModelEntry<'_>> {
    let fallback = registry.default_descriptor().key();
    registry
        .descriptors()
        .iter()
        .map(|d: &ModelDescriptor| ModelEntry {
            model: d.key(),
            default: d.key() == fallback,
            identities: d.identities(),
            uris: d.uris(),
            metrics: d.metrics().iter().map(|m| m.spec()).collect(),
        })
        .collect()
}

fn render_json(registry: &ModelRegistry) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&entries(registry))
}

fn render_table(registry: &ModelRegistry) -> Result<String, fmt::Error> {
    let mut out = String::new();
    for entry in entries(registry) {
        write_entry(&mut out, &entry)?;
    }
    Ok(out)
}

fn write_entry(out: &mut impl Write, entry: &ModelEntry<'_>) -> fmt::Result {
    let identities = if entry.identities.is_empty() {
        "-".to_string()
    } else {
        entry.identities.join(", ")
    };
    writeln!(
        out,
        "{}{}  [{}]  {} uris, {} metrics",
        entry.model,
        if entry.default { " (default)" } else { "" },
        identities,
        entry.uris.len(),
        entry.metrics.len()
    )?;
    for spec in &entry.metrics {
        writeln!(out, "  {:<45} {}", spec.name, rules(spec))?;
    }
    writeln!(out)
}

/// Short description of the non-default rules of a metric.
fn rules(spec: &MetricSpec) -> String {
    let mut rules = Vec::new();
    if spec.extraction == Extraction::Count {
        rules.push("count".to_string());
    }
    match spec.lexicon {
        Lexicon::Digits => {}
        Lexicon::RecordState => rules.push("record-state words".to_string()),
        Lexicon::PlayState => rules.push("play-state words".to_string()),
        Lexicon::ElapsedTime => rules.push("elapsed time".to_string()),
        Lexicon::Timestamp(format) => rules.push(format!("timestamp {}", format.pattern())),
    }
    match spec.correction {
        Correction::None => {}
        Correction::StreamEnabled => rules.push("2 -> 1".to_string()),
        Correction::MeterLevel => rules.push("negate positive".to_string()),
        Correction::RecordState => rules.push("3 -> 1".to_string()),
    }
    if rules.is_empty() {
        "-".to_string()
    } else {
        rules.join(", ")
    }
}
