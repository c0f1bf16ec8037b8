//! Delimited-text output.

use csv::Writer;

use super::FormatResult;
use crate::result::Tidy;

/// Header line then one line per row. Nulls are empty fields.
pub fn to_csv(tidy: &Tidy) -> FormatResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(&tidy.header)?;
    for row in &tidy.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
