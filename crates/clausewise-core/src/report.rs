//! Arrow representation of analysis results.
//!
//! One row per analyzed document. The same schema backs Parquet batch
//! reports and the single-document card rendered by the CLI.

use std::sync::Arc;

use arrow::array::{ListBuilder, StringBuilder, TimestampNanosecondArray, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};

use crate::analysis::AnalysisResult;

fn utf8_list() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

/// Schema for analysis report rows.
pub fn report_schema() -> Schema {
    Schema::new(vec![
        Field::new("source", DataType::Utf8, false),
        Field::new(
            "analyzed_at",
            DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
            false,
        ),
        Field::new("text_chars", DataType::UInt64, false),
        Field::new("parties", utf8_list(), false),
        Field::new("dates", utf8_list(), false),
        Field::new("amounts", utf8_list(), false),
        Field::new("risk_level", DataType::Utf8, false),
        Field::new("risk_terms", utf8_list(), false),
    ])
}

/// Accumulates analysis results into a single [`RecordBatch`].
pub struct ReportBuilder {
    source: StringBuilder,
    analyzed_at: Vec<i64>,
    text_chars: UInt64Builder,
    parties: ListBuilder<StringBuilder>,
    dates: ListBuilder<StringBuilder>,
    amounts: ListBuilder<StringBuilder>,
    risk_level: StringBuilder,
    risk_terms: ListBuilder<StringBuilder>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            source: StringBuilder::new(),
            analyzed_at: Vec::new(),
            text_chars: UInt64Builder::new(),
            parties: ListBuilder::new(StringBuilder::new()),
            dates: ListBuilder::new(StringBuilder::new()),
            amounts: ListBuilder::new(StringBuilder::new()),
            risk_level: StringBuilder::new(),
            risk_terms: ListBuilder::new(StringBuilder::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.analyzed_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzed_at.is_empty()
    }

    /// Append a row stamped with the current time.
    pub fn push(&mut self, source: &str, result: &AnalysisResult) {
        self.push_at(source, result, Utc::now());
    }

    pub fn push_at(&mut self, source: &str, result: &AnalysisResult, at: DateTime<Utc>) {
        self.source.append_value(source);
        self.analyzed_at
            .push(at.timestamp_nanos_opt().unwrap_or_default());
        self.text_chars
            .append_value(result.text().chars().count() as u64);
        append_strings(&mut self.parties, result.parties());
        append_strings(&mut self.dates, result.dates());
        append_strings(&mut self.amounts, result.amounts());
        self.risk_level
            .append_value(result.verdict().level().as_str());
        append_strings(&mut self.risk_terms, result.verdict().matched_terms());
    }

    pub fn finish(mut self) -> Result<RecordBatch, ArrowError> {
        let schema: SchemaRef = Arc::new(report_schema());
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(self.source.finish()),
                Arc::new(TimestampNanosecondArray::from(self.analyzed_at).with_timezone("UTC")),
                Arc::new(self.text_chars.finish()),
                Arc::new(self.parties.finish()),
                Arc::new(self.dates.finish()),
                Arc::new(self.amounts.finish()),
                Arc::new(self.risk_level.finish()),
                Arc::new(self.risk_terms.finish()),
            ],
        )
    }
}

fn append_strings<'a>(
    builder: &mut ListBuilder<StringBuilder>,
    values: impl IntoIterator<Item = &'a String>,
) {
    for value in values {
        builder.values().append_value(value);
    }
    builder.append(true);
}
