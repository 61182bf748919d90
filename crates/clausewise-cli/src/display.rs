//! Vertical card display for analysis reports.
//!
//! Renders one row of a report batch as a grouped, human-readable card:
//! document details, an excerpt of the extracted text, extracted facts,
//! the risk verdict and a closing summary. Report rows carry only the text
//! length, so the text itself is passed alongside.

use std::fmt::Write;

use arrow::array::*;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

const MAX_LIST_ITEMS: usize = 20;
const MAX_TEXT_CHARS: usize = 1500;

const SUMMARY: &str = "This contract includes key parties, dates, and monetary values. \
    Potential risks are identified based on legal clauses such as termination, \
    penalties, and liabilities.";

// ── Schema section groupings ──

const DOCUMENT: &[&str] = &["source", "text_chars", "analyzed_at"];

const FACTS: &[(&str, &str)] = &[
    ("Parties", "parties"),
    ("Dates", "dates"),
    ("Amounts", "amounts"),
];

// ── Public API ──

/// Render row `row` of a report batch as a card, with `text` as the
/// document's extracted text.
pub fn render_card(batch: &RecordBatch, row: usize, text: &str) -> anyhow::Result<String> {
    anyhow::ensure!(
        row < batch.num_rows(),
        "row {row} out of range ({} rows)",
        batch.num_rows()
    );

    let mut out = String::new();
    let source = get_utf8(batch, "source", row).unwrap_or_default();
    writeln!(out, "=== {source} ===")?;
    writeln!(out)?;

    write_scalars(&mut out, batch, row, "Document", DOCUMENT)?;
    write_text(&mut out, text)?;
    for &(header, col) in FACTS {
        write_list(&mut out, batch, row, header, col)?;
    }
    write_risk(&mut out, batch, row)?;

    writeln!(out, "Summary")?;
    writeln!(out, "  {SUMMARY}")?;
    Ok(out)
}

// ── Section rendering ──

fn write_scalars(
    out: &mut String,
    batch: &RecordBatch,
    row: usize,
    header: &str,
    cols: &[&str],
) -> std::fmt::Result {
    writeln!(out, "{header}")?;
    for &col_name in cols {
        let Some(col) = batch.column_by_name(col_name) else {
            continue;
        };
        if col.is_null(row) {
            continue;
        }
        let value = match col.data_type() {
            DataType::Utf8 => get_utf8(batch, col_name, row).unwrap_or_default(),
            DataType::UInt64 => col
                .as_any()
                .downcast_ref::<UInt64Array>()
                .map(|a| a.value(row).to_string())
                .unwrap_or_default(),
            _ => {
                // Timestamps and anything else use Arrow's display formatting.
                match arrow::util::display::ArrayFormatter::try_new(
                    col.as_ref(),
                    &Default::default(),
                ) {
                    Ok(fmt) => fmt.value(row).to_string(),
                    Err(_) => "-".to_string(),
                }
            }
        };
        writeln!(out, "  {:<14} {}", col_name, value)?;
    }
    writeln!(out)
}

fn write_text(out: &mut String, text: &str) -> std::fmt::Result {
    writeln!(out, "Extracted Text")?;
    if text.trim().is_empty() {
        writeln!(out, "  (no text)")?;
        return writeln!(out);
    }

    let total = text.chars().count();
    let excerpt: String = text.chars().take(MAX_TEXT_CHARS).collect();
    for line in excerpt.lines() {
        writeln!(out, "  {}", line.trim_end())?;
    }
    if total > MAX_TEXT_CHARS {
        writeln!(out, "  ... ({} more characters)", total - MAX_TEXT_CHARS)?;
    }
    writeln!(out)
}

fn write_list(
    out: &mut String,
    batch: &RecordBatch,
    row: usize,
    header: &str,
    col_name: &str,
) -> std::fmt::Result {
    let items = list_utf8(batch, col_name, row);
    writeln!(out, "{header} ({})", items.len())?;
    if items.is_empty() {
        writeln!(out, "  (none found)")?;
    }
    for item in items.iter().take(MAX_LIST_ITEMS) {
        writeln!(out, "  - {item}")?;
    }
    if items.len() > MAX_LIST_ITEMS {
        writeln!(out, "  ... and {} more", items.len() - MAX_LIST_ITEMS)?;
    }
    writeln!(out)
}

fn write_risk(out: &mut String, batch: &RecordBatch, row: usize) -> std::fmt::Result {
    let level = get_utf8(batch, "risk_level", row).unwrap_or_default();
    let terms = list_utf8(batch, "risk_terms", row);

    writeln!(out, "Risk")?;
    writeln!(out, "  Risk Level: {level}")?;
    if !terms.is_empty() {
        writeln!(out, "  Reason: {}", terms.join(", "))?;
    }
    writeln!(out)
}

// ── Helpers ──

fn get_utf8(batch: &RecordBatch, col_name: &str, row: usize) -> Option<String> {
    let col = batch.column_by_name(col_name)?;
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|a| a.value(row).to_string())
}

fn list_utf8(batch: &RecordBatch, col_name: &str, row: usize) -> Vec<String> {
    let Some(list) = batch
        .column_by_name(col_name)
        .and_then(|c| c.as_any().downcast_ref::<ListArray>())
    else {
        return Vec::new();
    };
    if list.is_null(row) {
        return Vec::new();
    }
    let values = list.value(row);
    let Some(strings) = values.as_any().downcast_ref::<StringArray>() else {
        return Vec::new();
    };
    (0..strings.len())
        .filter(|&i| !strings.is_null(i))
        .map(|i| strings.value(i).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use clausewise_core::{Analyzer, NullRecognizer, ReportBuilder};

    const SCENARIO: &str = "This Agreement is between Acme Technologies and Beta Solutions, for a \
        term of 12 months, with payment of \u{20b9}50,000. Either party may \
        terminate for breach.";

    fn report(rows: &[(&str, &str)]) -> RecordBatch {
        let analyzer = Analyzer::new(Arc::new(NullRecognizer));
        let mut builder = ReportBuilder::new();
        for (source, text) in rows {
            builder.push(source, &analyzer.analyze_text(*text).unwrap());
        }
        builder.finish().unwrap()
    }

    #[test]
    fn high_risk_card() {
        let batch = report(&[("msa.txt", SCENARIO)]);
        let card = render_card(&batch, 0, SCENARIO).unwrap();

        assert!(card.starts_with("=== msa.txt ==="));
        assert!(card.contains("Parties (2)"));
        assert!(card.contains("  - Acme Technologies"));
        assert!(card.contains("  - Beta Solutions"));
        assert!(card.contains("  - 12 months"));
        assert!(card.contains("  - \u{20b9}50,000"));
        assert!(card.contains("Risk Level: HIGH"));
        assert!(card.contains("Reason: terminate"));
        assert!(card.trim_end().ends_with("penalties, and liabilities."));
    }

    #[test]
    fn low_risk_card_has_no_reason() {
        let text = "Payment is due within 30 days.";
        let batch = report(&[("note.txt", text)]);
        let card = render_card(&batch, 0, text).unwrap();

        assert!(card.contains("Risk Level: LOW"));
        assert!(!card.contains("Reason:"));
        assert!(card.contains("Parties (0)\n  (none found)"));
        assert!(card.contains("Summary"));
    }

    #[test]
    fn document_section_shows_size() {
        let batch = report(&[("a.txt", "abc"), ("b.txt", "penalty")]);
        let card = render_card(&batch, 1, "penalty").unwrap();
        assert!(card.starts_with("=== b.txt ==="));
        assert!(card.contains("text_chars     7"));
        assert!(card.contains("analyzed_at"));
    }

    #[test]
    fn out_of_range_row_is_an_error() {
        let batch = report(&[("a.txt", "abc")]);
        assert!(render_card(&batch, 1, "abc").is_err());
    }

    #[test]
    fn extracted_text_section_shows_the_contract() {
        let text = "SERVICE AGREEMENT\nEither party may terminate for breach.";
        let batch = report(&[("msa.txt", text)]);
        let card = render_card(&batch, 0, text).unwrap();

        assert!(card.contains(
            "Extracted Text\n  SERVICE AGREEMENT\n  Either party may terminate for breach.\n"
        ));
        let text_at = card.find("Extracted Text").unwrap();
        assert!(text_at < card.find("Parties (").unwrap());
    }

    #[test]
    fn long_text_is_shortened() {
        let text = "x".repeat(MAX_TEXT_CHARS + 25);
        let batch = report(&[("long.txt", text.as_str())]);
        let card = render_card(&batch, 0, &text).unwrap();

        assert!(card.contains("... (25 more characters)"));
        assert!(!card.contains(&text));
    }

    #[test]
    fn blank_text_is_marked() {
        let batch = report(&[("blank.txt", "")]);
        let card = render_card(&batch, 0, "").unwrap();
        assert!(card.contains("Extracted Text\n  (no text)"));
    }
}
