// ---------------------------------------------------------------------------
// Batch identifier – canonical label from a raw filename
// ---------------------------------------------------------------------------

/// Copy prefix inserted by the Spanish-locale Drive/Explorer when a file is
/// duplicated before re-export.
const COPY_PREFIX: &str = "Copia de ";

/// Derive the canonical batch label from an export filename.
///
/// Strips, in order: one recognized extension (`.csv` / `.xlsx`,
/// case-insensitive), a trailing `_R<digits>` re-export suffix, any
/// occurrence of the localized copy prefix, and surrounding whitespace.
///
/// Idempotent: applying it to its own output is a no-op.
pub fn canonicalize_label(filename: &str) -> String {
    let mut name = strip_extension(filename);
    name = strip_revision_suffix(name);
    name.replace(COPY_PREFIX, "").trim().to_string()
}

fn strip_extension(name: &str) -> &str {
    for ext in [".csv", ".xlsx"] {
        if name.len() > ext.len() {
            // `get` instead of slicing: the byte offset may fall inside a
            // multi-byte character for non-ASCII filenames.
            if let Some(tail) = name.get(name.len() - ext.len()..) {
                if tail.eq_ignore_ascii_case(ext) {
                    return &name[..name.len() - ext.len()];
                }
            }
        }
    }
    name
}

/// Drop a trailing `_R<digits>` marker (reprint / repeated export).
fn strip_revision_suffix(name: &str) -> &str {
    if let Some(pos) = name.rfind("_R") {
        let digits = &name[pos + 2..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return &name[..pos];
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_extension_revision_and_copy_prefix() {
        assert_eq!(canonicalize_label("Copia de BA-003-25_R2.xlsx"), "BA-003-25");
        assert_eq!(canonicalize_label("BA-003-25.csv"), "BA-003-25");
        assert_eq!(canonicalize_label("BA-003-25_R10.CSV"), "BA-003-25");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(canonicalize_label("lote7.XLSX"), "lote7");
    }

    #[test]
    fn revision_suffix_requires_digits() {
        assert_eq!(canonicalize_label("BA-01_Retry.csv"), "BA-01_Retry");
        assert_eq!(canonicalize_label("BA-01_R.csv"), "BA-01_R");
    }

    #[test]
    fn idempotent_on_already_canonical_labels() {
        let once = canonicalize_label("Copia de GPF-12-26_R3.csv");
        assert_eq!(canonicalize_label(&once), once);
    }

    #[test]
    fn plain_name_passes_through_trimmed() {
        assert_eq!(canonicalize_label("  GPF-12-26 "), "GPF-12-26");
    }
}
