//! Parquet output for batch analysis reports.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Write `batch` to a Parquet file at `path`, replacing any existing file.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("opening parquet writer")?;
    writer.write(batch).context("writing report rows")?;
    writer.close().context("finalizing parquet file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Array, StringArray};
    use clausewise_core::{Analyzer, NullRecognizer, ReportBuilder, report_schema};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    #[test]
    fn report_roundtrips_through_parquet() {
        let analyzer = Analyzer::new(Arc::new(NullRecognizer));
        let mut builder = ReportBuilder::new();
        builder.push(
            "lease.txt",
            &analyzer
                .analyze_text("Beta Solutions owes a penalty of \u{20b9}1,00,000.")
                .unwrap(),
        );
        builder.push("memo.txt", &analyzer.analyze_text("Nothing here.").unwrap());
        let batch = builder.finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.parquet");
        write_parquet(&path, &batch).unwrap();

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(batches.len(), 1);

        let read = &batches[0];
        assert_eq!(read.num_rows(), 2);
        assert_eq!(read.schema().fields().len(), report_schema().fields().len());

        let levels = read
            .column_by_name("risk_level")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(levels.value(0), "HIGH");
        assert_eq!(levels.value(1), "LOW");
        assert_eq!(levels.len(), 2);
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let batch = ReportBuilder::new().finish().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.parquet");
        assert!(write_parquet(&path, &batch).is_err());
    }
}
