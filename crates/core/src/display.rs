//! Phoebus display-builder (`.bob`) generation.
//!
//! The main display stacks one embedded row per target. Each row loads
//! the shared row template with the macro `PV` set to the target name,
//! so the template can bind to `$(PV)`, `$(PV):LOW`, `$(PV):STATUS`, etc.

/// Vertical spacing between rows.
pub const ROW_HEIGHT: u32 = 40;

/// Width of the main display and of every row.
pub const DISPLAY_WIDTH: u32 = 800;

/// Extra space below the last row.
const FOOTER_HEIGHT: u32 = 50;

/// Title shown in the display builder.
const DISPLAY_NAME: &str = "PVwatcher Main Display";

/// Render the main display for `pv_names`, embedding `template_file` once
/// per PV.
pub fn render_display<S: AsRef<str>>(pv_names: &[S], template_file: &str) -> String {
    let rows = pv_names.len() as u32;
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<display version=\"2.0.0\">\n");
    out.push_str(&format!("  <name>{DISPLAY_NAME}</name>\n"));
    out.push_str(&format!("  <width>{DISPLAY_WIDTH}</width>\n"));
    out.push_str(&format!(
        "  <height>{}</height>\n",
        rows * ROW_HEIGHT + FOOTER_HEIGHT
    ));

    let template = escape_xml(template_file);
    for (i, pv) in pv_names.iter().enumerate() {
        let y = i as u32 * ROW_HEIGHT;
        out.push_str("  <widget type=\"embedded\" version=\"2.0.0\">\n");
        out.push_str(&format!("    <name>Row_{i}</name>\n"));
        out.push_str(&format!("    <file>{template}</file>\n"));
        out.push_str("    <x>0</x>\n");
        out.push_str(&format!("    <y>{y}</y>\n"));
        out.push_str(&format!("    <width>{DISPLAY_WIDTH}</width>\n"));
        out.push_str(&format!("    <height>{ROW_HEIGHT}</height>\n"));
        out.push_str("    <macros>\n");
        out.push_str(&format!("      <PV>{}</PV>\n", escape_xml(pv.as_ref())));
        out.push_str("    </macros>\n");
        out.push_str("  </widget>\n");
    }

    out.push_str("</display>\n");
    out
}

/// Escape the five XML special characters.
fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
