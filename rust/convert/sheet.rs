use std::{fs::File, io::Write, iter, path::PathBuf};

use calamine::{Data, ExcelDateTime, Range, Reader, Xlsx, open_workbook};
use chrono::{Duration, NaiveTime};
use csv::WriterBuilder;
use tracing::debug;

use crate::{
    convert::{Conversion, Job},
    error::{ConversionError, ConversionResult},
};

/// Writes the first worksheet of a workbook as CSV.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxToCsv;

impl Conversion for XlsxToCsv {
    fn name(&self) -> &'static str {
        "xlsx-to-csv"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        &["xlsx"]
    }

    fn output_extension(&self) -> &str {
        "csv"
    }

    fn render(&self, job: &Job<'_>) -> ConversionResult<Vec<PathBuf>> {
        let mut workbook: Xlsx<_> = open_workbook(job.input)?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ConversionError::library("workbook has no worksheets"))?;
        let range = workbook.worksheet_range(&sheet)?;
        debug!(sheet = %sheet, rows = range.height(), columns = range.width(), "writing sheet");

        let path = job.staged_file();
        write_csv(&range, File::create(&path)?)?;
        Ok(vec![path])
    }
}

/// Rows and columns before the used range are written as empty cells so
/// the CSV keeps the sheet's coordinates.
fn write_csv<W: Write>(range: &Range<Data>, writer: W) -> ConversionResult<()> {
    let mut csv = WriterBuilder::new().flexible(true).from_writer(writer);
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let width = first_col as usize + range.width();

    for _ in 0..first_row {
        csv.write_record(iter::repeat_n("", width))?;
    }
    for row in range.rows() {
        let padding = (0..first_col).map(|_| String::new());
        csv.write_record(padding.chain(row.iter().map(cell_text)))?;
    }

    csv.flush()?;
    Ok(())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(value) => datetime_text(value),
        Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Date cells are written as `YYYY-MM-DD`, with the time of day appended
/// when there is one. Serials below one day are plain times.
fn datetime_text(value: &ExcelDateTime) -> String {
    if value.is_duration() {
        return match value.as_duration() {
            Some(duration) => duration_text(duration),
            None => value.as_f64().to_string(),
        };
    }
    match value.as_datetime() {
        Some(datetime) if value.as_f64() < 1.0 => datetime.format("%H:%M:%S").to_string(),
        Some(datetime) if datetime.time() == NaiveTime::MIN => datetime.format("%Y-%m-%d").to_string(),
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => value.as_f64().to_string(),
    }
}

/// Elapsed time as `[-]H:MM:SS`; hours are not wrapped at a day.
fn duration_text(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    format!("{sign}{}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60)
}
