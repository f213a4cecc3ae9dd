//! CLI presentation: report types and their text/JSON renderings.

use crate::context::EventKind;
use crate::marshal::ContextRecord;
use crate::mask::BitMask;
use crate::registry::TypeDeclaration;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AdaptReport {
    pub from: String,
    pub to: String,
    pub original_mask: String,
    pub adapted_mask: String,
    /// Properties of the declared type whose bit is set in the adapted mask
    pub changed: Vec<String>,
}

impl AdaptReport {
    pub fn new(
        from: &str,
        to: &str,
        original: BitMask,
        adapted: BitMask,
        target_properties: &[String],
    ) -> Self {
        let changed = if adapted.is_all() {
            target_properties.to_vec()
        } else {
            adapted
                .positions()
                .filter_map(|pos| target_properties.get(pos).cloned())
                .collect()
        };
        Self {
            from: from.to_string(),
            to: to.to_string(),
            original_mask: original.to_string(),
            adapted_mask: adapted.to_string(),
            changed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub event_kind: &'static str,
    pub propagation_number: i64,
    pub rule_origin: Option<String>,
    pub tuple_origin: Option<u64>,
    pub entry_point: String,
    pub origin_offset: i32,
    pub original_mask: String,
}

impl InspectReport {
    pub fn from_record(record: &ContextRecord) -> anyhow::Result<Self> {
        Ok(Self {
            event_kind: EventKind::label_for_code(record.event_kind)?,
            propagation_number: record.propagation_number,
            rule_origin: record.rule_origin.as_ref().map(ToString::to_string),
            tuple_origin: record.tuple_origin.map(|t| t.0),
            entry_point: record.entry_point.name().to_string(),
            origin_offset: record.origin_offset,
            original_mask: record.original_mask().to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TypeReport {
    pub class: String,
    pub structural: bool,
    pub properties: Vec<String>,
}

impl TypeReport {
    pub fn from_declaration(declaration: &TypeDeclaration) -> Self {
        Self {
            class: declaration.class.qualified_name(),
            structural: declaration.class.is_structural(),
            properties: declaration.settable_properties.to_vec(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn format_adapt_report(report: &AdaptReport, format: &str) -> anyhow::Result<String> {
    if format == "json" {
        return to_json(report);
    }
    Ok(format!(
        "{} -> {}\n  Original mask: {}\n  Adapted mask:  {}\n  Changed in {}: {}",
        report.from,
        report.to,
        report.original_mask,
        report.adapted_mask,
        report.to,
        if report.changed.is_empty() {
            "(none)".to_string()
        } else {
            report.changed.join(", ")
        }
    ))
}

pub fn format_inspect_report(report: &InspectReport, format: &str) -> anyhow::Result<String> {
    if format == "json" {
        return to_json(report);
    }
    Ok(format!(
        "Propagation #{}\n  Kind: {}\n  Rule: {}\n  Tuple: {}\n  Entry point: {}\n  Origin offset: {}\n  Original mask: {}",
        report.propagation_number,
        report.event_kind,
        report.rule_origin.as_deref().unwrap_or("none"),
        report
            .tuple_origin
            .map_or_else(|| "none".to_string(), |t| t.to_string()),
        report.entry_point,
        report.origin_offset,
        report.original_mask,
    ))
}

pub fn format_types_report(reports: &[TypeReport], format: &str) -> anyhow::Result<String> {
    if format == "json" {
        return to_json(&reports);
    }
    if reports.is_empty() {
        return Ok("No types declared.".to_string());
    }
    let mut lines = Vec::new();
    for report in reports {
        let kind = if report.structural { "structural" } else { "class" };
        lines.push(format!("{} ({})", report.class, kind));
        for (pos, property) in report.properties.iter().enumerate() {
            lines.push(format!("  {:>2}: {}", pos, property));
        }
    }
    Ok(lines.join("\n"))
}
