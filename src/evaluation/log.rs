use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::evaluation::EvaluationRecord;

/// Result file, one JSON record per line.
pub struct ResultLog {
    path:PathBuf,
    writer:BufWriter<File>,
    written:usize,
}

impl ResultLog {
    /// Truncates any existing file.
    pub fn create(path:impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self { path, writer: BufWriter::new(file), written: 0 })
    }

    pub fn append(path:impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: BufWriter::new(file), written: 0 })
    }

    pub fn write(&mut self,record:&EvaluationRecord) -> Result<()> {
        record.validate()?;
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        debug!(path = %self.path.display(), sequence_type = %record.sequence_type, steps = record.len(), "wrote result record");
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

/// Reads every record back, rejecting records whose sequences disagree in length.
pub fn read_records(path:impl AsRef<Path>) -> Result<Vec<EvaluationRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = vec![];
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {continue}
        let record:EvaluationRecord = serde_json::from_str(&line)?;
        record.validate()?;
        records.push(record);
    }
    Ok(records)
}
