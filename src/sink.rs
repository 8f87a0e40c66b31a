use crate::error::{Result, ScrapeError};
use crate::results::Record;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tokio::sync::{mpsc, oneshot};

/// Final destination for the collected records
pub trait RecordSink {
    /// Persist all records, in order. Called once per run.
    fn write_records(&mut self, records: &[Record]) -> Result<()>;
}

/// Writes a header row followed by one row per record
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    /// Create (or truncate) the output file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        ::log::debug!("Writing CSV to {}", path.display());
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(writer: W) -> Self {
        // Headers are written explicitly so an empty run still gets one
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        Self { writer }
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| {
            ScrapeError::Io(io::Error::new(e.error().kind(), e.error().to_string()))
        })
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_records(&mut self, records: &[Record]) -> Result<()> {
        self.writer.write_record(Record::HEADERS)?;
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;

        ::log::info!("Wrote {} records", records.len());
        Ok(())
    }
}

/// Prints a count followed by every record
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for ConsoleSink<W> {
    fn write_records(&mut self, records: &[Record]) -> Result<()> {
        writeln!(self.out, "Scraped {} products", records.len())?;
        for record in records {
            writeln!(
                self.out,
                "Name: {}\nPrice: {}\nImage: {}\nURL: {}\n",
                record.name, record.price, record.image, record.url
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Spawns the single consumer that owns the collected records.
///
/// Records sent on the returned sender are appended in send order. Once every
/// sender is dropped the consumer hands the full list back on the receiver.
pub fn spawn_collector() -> (mpsc::UnboundedSender<Record>, oneshot::Receiver<Vec<Record>>) {
    let (record_tx, mut record_rx) = mpsc::unbounded_channel::<Record>();
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut records = Vec::new();
        while let Some(record) = record_rx.recv().await {
            ::log::trace!("Collected {}", record.name);
            records.push(record);
        }

        ::log::debug!("Collector finished with {} records", records.len());
        if done_tx.send(records).is_err() {
            ::log::warn!("Nobody waiting for collected records");
        }
    });

    (record_tx, done_rx)
}

/// Waits for the collector to hand back its records
pub async fn finish_collecting(done: oneshot::Receiver<Vec<Record>>) -> Result<Vec<Record>> {
    done.await.map_err(|_| ScrapeError::ChannelClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::RecordTx;

    fn record(name: &str, url: &str) -> Record {
        Record::from_fields(name, "$1.00", format!("{}.jpg", url), url).unwrap()
    }

    #[test]
    fn test_csv_header_then_rows_in_order() {
        let mut sink = CsvSink::from_writer(Vec::new());
        sink.write_records(&[record("First", "u1"), record("Second, with comma", "u2")])
            .unwrap();

        let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "name,price,image,url");
        assert_eq!(lines[1], "First,$1.00,u1.jpg,u1");
        assert_eq!(lines[2], "\"Second, with comma\",$1.00,u2.jpg,u2");
    }

    #[test]
    fn test_csv_empty_run_still_has_header() {
        let mut sink = CsvSink::from_writer(Vec::new());
        sink.write_records(&[]).unwrap();
        let output = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(output, "name,price,image,url\n");
    }

    #[test]
    fn test_csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        {
            let mut sink = CsvSink::create(&path).unwrap();
            sink.write_records(&[record("A", "u1"), record("B", "u2")]).unwrap();
        }

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<Record> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![record("A", "u1"), record("B", "u2")]);
    }

    #[test]
    fn test_csv_create_in_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = CsvSink::create(dir.path().join("missing").join("out.csv"));
        assert!(matches!(result, Err(ScrapeError::Io(_))));
    }

    #[test]
    fn test_console_summary() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.write_records(&[record("Hoodie", "/p/hoodie")]).unwrap();
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("Scraped 1 products\n"));
        assert!(output.contains("Name: Hoodie\nPrice: $1.00\nImage: /p/hoodie.jpg\nURL: /p/hoodie\n"));
    }

    #[tokio::test]
    async fn test_collector_keeps_send_order() {
        let (mut tx, done) = spawn_collector();
        for i in 0..50 {
            tx.emit(record(&format!("item {}", i), &format!("u{}", i))).unwrap();
        }
        drop(tx);

        let records = finish_collecting(done).await.unwrap();
        assert_eq!(records.len(), 50);
        assert!(records.iter().enumerate().all(|(i, r)| r.url == format!("u{}", i)));
    }

    #[tokio::test]
    async fn test_collector_with_no_records() {
        let (tx, done) = spawn_collector();
        drop(tx);
        assert!(finish_collecting(done).await.unwrap().is_empty());
    }
}
