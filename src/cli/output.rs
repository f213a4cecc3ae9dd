//! CLI output: error mapping from domain errors to a stable CLI surface.

/// Render an error and its causes on one line each.
pub fn map_error(e: &anyhow::Error) -> String {
    let mut out = e.to_string();
    for cause in e.chain().skip(1) {
        out.push_str(&format!("\n  caused by: {}", cause));
    }
    out
}
