use std::io::{self, Write};

use crate::series::SeriesPoint;

pub const SERIES_CSV_HEADER: &str = "step,label,value\n";

pub struct SeriesCsvWriter<W: Write> {
    writer: W,
}

impl<W: Write> SeriesCsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.writer.write_all(SERIES_CSV_HEADER.as_bytes())
    }

    pub fn append_points(&mut self, points: &[SeriesPoint]) -> io::Result<()> {
        for point in points {
            let label = escape_csv_field(&point.label);
            writeln!(self.writer, "{},{label},{}", point.step, point.value)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Renders a full series, header included, as a CSV string.
pub fn series_to_csv(points: &[SeriesPoint]) -> io::Result<String> {
    let mut writer = SeriesCsvWriter::new(Vec::new());
    writer.write_header()?;
    writer.append_points(points)?;
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn escape_csv_field(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|ch| matches!(ch, ',' | '"' | '\n' | '\r'));
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('"', "\"\"");
    format!("\"{escaped}\"")
}
