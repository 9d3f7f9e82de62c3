use std::io::Write;

use anyhow::Result;

use shadow_scan::{EdgeRecord, EdgeSink};

const HEADER: [&str; 9] = [
    "start_lat",
    "start_lon",
    "end_lat",
    "end_lon",
    "left_shadow",
    "right_shadow",
    "distance",
    "direction",
    "avoid",
];

/// Writes one CSV row per edge. The header is written up front, so even a scan with no segments
/// produces a well-formed file. Every row is flushed to the inner writer as soon as it's written,
/// so an interrupted scan leaves only whole rows behind.
pub struct CsvEdgeSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvEdgeSink<W> {
    pub fn new(inner: W) -> Result<CsvEdgeSink<W>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(&HEADER)?;
        writer.flush()?;
        Ok(CsvEdgeSink { writer })
    }
}

impl<W: Write> EdgeSink for CsvEdgeSink<W> {
    fn write_edge(&mut self, edge: &EdgeRecord) -> Result<()> {
        self.writer.serialize(edge)?;
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
