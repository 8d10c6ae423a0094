//! Utilities for working with CSV files.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer};
use rustc_hash::FxHashMap;

use crate::record::RawRow;

pub struct CsvWriter {
    writer: Writer<File>,
}
impl CsvWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn append<R>(&mut self, record: R) -> Result<(), csv::Error>
    where
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        self.writer.write_record(record)
    }

    pub fn flush(&mut self) -> Result<(), csv::Error> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads a headed CSV file as a sequence of [RawRow]s keyed by header name. Repeated header names
/// are disambiguated by appending `.1`, `.2`, etc. to the second and subsequent occurrences, so a
/// schedule table with two `xG` columns yields `xG` and `xG.1`.
pub struct CsvReader {
    reader: csv::Reader<File>,
    headers: Vec<String>,
    record: StringRecord,
}
impl CsvReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = dedupe_headers(reader.headers()?.iter());
        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for CsvReader {
    type Item = Result<RawRow, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(Ok(RawRow::from_iter(
                self.headers
                    .iter()
                    .cloned()
                    .zip(self.record.iter().map(ToString::to_string)),
            ))),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

pub fn dedupe_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
    headers
        .into_iter()
        .map(|header| {
            let occurrences = seen.entry(header).or_insert(0);
            let deduped = if *occurrences == 0 {
                header.to_string()
            } else {
                format!("{header}.{occurrences}")
            };
            *occurrences += 1;
            deduped
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn dedupe_repeated_headers() {
        assert_eq!(
            vec!["Home", "xG", "Score", "xG.1", "Away", "xG.2"],
            dedupe_headers(["Home", "xG", "Score", "xG", "Away", "xG"])
        );
    }

    #[test]
    fn read_quoted_fields() {
        let path = std::env::temp_dir().join(format!("matchform-csv-{}.csv", std::process::id()));
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "Date,Home,xG,Score,xG,Away,Attendance").unwrap();
            writeln!(file, "2023-08-12,Chelsea,1.2,1–1,0.8,Liverpool,\"40,096\"").unwrap();
        }
        let mut reader = CsvReader::open(&path).unwrap();
        assert_eq!(7, reader.headers().len());
        let row = reader.next().unwrap().unwrap();
        assert_eq!(Some("0.8"), row.get("xG.1"));
        assert_eq!(Some("40,096"), row.get("Attendance"));
        assert!(reader.next().is_none());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn write_then_read() {
        let path = std::env::temp_dir().join(format!("matchform-csv-w-{}.csv", std::process::id()));
        {
            let mut writer = CsvWriter::create(&path).unwrap();
            writer.append(["Home", "Venue"]).unwrap();
            writer.append(["Nott'ham Forest", "The City Ground, Nottingham"]).unwrap();
            writer.flush().unwrap();
        }
        let row = CsvReader::open(&path).unwrap().next().unwrap().unwrap();
        assert_eq!(Some("The City Ground, Nottingham"), row.get("Venue"));
        std::fs::remove_file(path).unwrap();
    }
}
