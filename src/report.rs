//! Reportes legibles de un pipeline (ejecutado o no).
//!
//! Sólo usa la API de introspección del core. Los diferidos se muestran con
//! su estado en el momento del reporte.

use std::fmt::Write as _;

use chrono::SecondsFormat;
use pipeflow_core::{Inspect, Pipeline, Step, Value};
use serde_json::json;

fn compact(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_snapshot_json().to_string()).collect();
    parts.join(", ")
}

/// Una línea por step más una cabecera con el estado agregado.
pub fn render_text(pipeline: &Pipeline) -> String {
    let mut out = String::new();
    let _ = write!(out, "pipeline: {} ({} steps", pipeline.status(), pipeline.len());
    if let Some(summary) = pipeline.summary() {
        let _ = write!(out,
                       ", {:.3} ms, started {}",
                       summary.elapsed_ms,
                       summary.started_at.to_rfc3339_opts(SecondsFormat::Millis, true));
    }
    out.push_str(")\n");

    for (position, step) in pipeline.steps().iter().enumerate() {
        render_step(&mut out, position, step);
    }

    match pipeline.result() {
        Ok(value) => {
            let _ = writeln!(out, "result: {}", value.to_snapshot_json());
        }
        Err(_) => {
            if let Some(failed) = pipeline.failed_step() {
                let _ = writeln!(out,
                                 "failed at '{}': {} ({})",
                                 failed.name(),
                                 failed.failure_message().unwrap_or_default(),
                                 failed.failure_reason().map_or("", |r| r.as_str()));
            }
        }
    }
    out
}

fn render_step(out: &mut String, position: usize, step: &Step) {
    let _ = write!(out, "  [{position}] {:<16} {:<12}", step.name(), step.status().as_str());
    if let Some(args) = step.resolved_args() {
        let _ = write!(out, " args=[{}]", compact(args));
    }
    if let Ok(value) = step.result() {
        let _ = write!(out, " -> {}", value.to_snapshot_json());
    }
    if let Some(reason) = step.failure_reason() {
        let _ = write!(out, " !! {}", reason.as_str());
    }
    if let Some(ms) = step.elapsed_ms() {
        let _ = write!(out, " ({ms:.3} ms)");
    }
    out.push('\n');
}

/// Representación JSON estable del pipeline y sus steps.
pub fn render_json(pipeline: &Pipeline) -> serde_json::Value {
    let steps: Vec<serde_json::Value> =
        pipeline.steps()
                .iter()
                .map(|s| {
                    json!({
                        "index": s.sequence_index(),
                        "name": s.name(),
                        "kind": s.kind(),
                        "status": s.status(),
                        "resolved_args": s.resolved_args().map(|a| a.iter().map(Value::to_snapshot_json).collect::<Vec<_>>()),
                        "result": s.result().ok().map(Value::to_snapshot_json),
                        "failure": s.failure().map(|f| f.to_json()),
                        "elapsed_ms": s.elapsed_ms(),
                    })
                })
                .collect();
    json!({
        "status": pipeline.status(),
        "definition_hash": pipeline.definition_hash(),
        "args": pipeline.args(),
        "elapsed_ms": pipeline.elapsed_ms(),
        "result": pipeline.result().ok().map(Value::to_snapshot_json),
        "failed_step": pipeline.failed_step().map(Step::name),
        "steps": steps,
    })
}
