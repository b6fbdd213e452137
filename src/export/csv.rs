use encoding_rs::WINDOWS_1250;

use super::ExportError;

/// Start of the header line; everything before it is a preamble.
pub const HEADER_MARKER: &[u8] = b"#Data";

/// Turn a raw export into a plain UTF-8 CSV.
///
/// Drops the preamble before the header line, decodes windows-1250, switches
/// to `\n` line endings and removes the two blank lines the export ends with.
pub fn normalize_export_csv(raw: &[u8]) -> Result<String, ExportError> {
    let start = raw
        .windows(HEADER_MARKER.len())
        .position(|window| window == HEADER_MARKER)
        .ok_or(ExportError::MissingHeader)?;

    let (text, had_errors) = WINDOWS_1250.decode_without_bom_handling(&raw[start..]);
    if had_errors {
        tracing::warn!("export contains bytes outside windows-1250; replaced");
    }

    let mut csv = text.replace("\r\n", "\n");
    for _ in 0..2 {
        if csv.ends_with('\n') && csv[..csv.len() - 1].ends_with('\n') {
            csv.pop();
        }
    }
    Ok(csv)
}
