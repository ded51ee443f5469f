use anyhow::Result;
use clap::ValueEnum;
use inventory_core::{Asset, InventoryReport, RawRecord, SourceOutcome, SourceReport};
use serde_json::json;
use std::io::Write;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Jsonl,
}

pub const CSV_HEADER: [&str; 7] = ["source", "asset_id", "hostname", "ip_address", "os", "environment", "owner_context"];

pub fn write_assets<W: Write>(w: &mut W, assets: &[&Asset], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for a in assets {
                writeln!(w, "{}", a.summary())?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *w, assets)?;
            writeln!(w)?;
        }
        OutputFormat::Jsonl => {
            for a in assets {
                serde_json::to_writer(&mut *w, a)?;
                writeln!(w)?;
            }
        }
    }
    Ok(())
}

/// CSV drops `raw`; use JSON output when the upstream payload matters.
pub fn write_assets_csv<W: Write>(w: W, assets: &[&Asset]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(CSV_HEADER)?;
    for a in assets {
        wtr.write_record([
            a.source(),
            a.asset_id(),
            a.hostname(),
            a.ip_address().unwrap_or_default(),
            a.os().unwrap_or_default(),
            a.environment().unwrap_or_default(),
            a.owner_context().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Record count, first record and its field names for one source's raw payload.
pub fn write_preview<W: Write>(w: &mut W, source: &str, records: &[RawRecord]) -> Result<()> {
    writeln!(w, "=== {} PREVIEW ===", source.to_uppercase())?;
    writeln!(w, "Records: {}", records.len())?;
    match records.first() {
        Some(first) => {
            writeln!(w, "First record:")?;
            writeln!(w, "{}", serde_json::to_string_pretty(first)?)?;
            writeln!(w, "Fields:")?;
            for k in first.keys() {
                writeln!(w, " - {}", k)?;
            }
        }
        None => writeln!(w, "(no records)")?,
    }
    Ok(())
}

fn source_json(s: &SourceReport) -> serde_json::Value {
    let (status, assets, error) = match &s.outcome {
        SourceOutcome::Collected(n) => ("ok", Some(*n), None),
        SourceOutcome::Failed(e) => (e.kind(), None, Some(e.to_string())),
        SourceOutcome::Aborted(msg) => ("aborted", None, Some(msg.clone())),
    };
    json!({
        "source": s.source,
        "status": status,
        "assets": assets,
        "error": error,
        "elapsed_ms": s.elapsed.as_millis() as u64,
    })
}

pub fn write_report<W: Write>(w: &mut W, report: &InventoryReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for s in report.sources() {
                let status = match &s.outcome {
                    SourceOutcome::Collected(_) => "ok",
                    SourceOutcome::Failed(e) => e.kind(),
                    SourceOutcome::Aborted(_) => "aborted",
                };
                writeln!(w, "{:<12} {:<10} {:>6}ms  {}", s.source, status, s.elapsed.as_millis(), s.detail())?;
            }
            let failed = report.failures().count();
            writeln!(w, "total: {} assets from {} sources ({} failed)", report.assets().len(), report.sources().len(), failed)?;
        }
        OutputFormat::Json => {
            let generated_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
            let sources: Vec<_> = report.sources().iter().map(source_json).collect();
            let obj = json!({
                "generated_at": generated_at,
                "total_assets": report.assets().len(),
                "complete": report.is_complete(),
                "sources": sources,
            });
            serde_json::to_writer_pretty(&mut *w, &obj)?;
            writeln!(w)?;
        }
        OutputFormat::Jsonl => {
            for s in report.sources() {
                serde_json::to_writer(&mut *w, &source_json(s))?;
                writeln!(w)?;
            }
        }
    }
    Ok(())
}
