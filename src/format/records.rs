//! JSON records: one object per tidy row, keys in header order.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::FormatResult;
use crate::result::{Scalar, Tidy};

struct Record<'a> {
    header: &'a [String],
    row: &'a [Scalar],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.header.len()))?;
        for (column, value) in self.header.iter().zip(self.row) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[derive(serde::Serialize)]
struct Records<'a> {
    data: Vec<Record<'a>>,
}

pub fn to_records(tidy: &Tidy) -> FormatResult<String> {
    let records = Records {
        data: tidy
            .rows
            .iter()
            .map(|row| Record {
                header: &tidy.header,
                row,
            })
            .collect(),
    };
    Ok(serde_json::to_string(&records)?)
}
