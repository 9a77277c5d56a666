//! Streaming JSON-array archives (optionally gzip-compressed)

use crate::error::{ResearchError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Writes a pretty-printed JSON array item by item into a `.gz` file,
/// so a market with many trade pages never has to sit in memory.
pub struct GzJsonArrayWriter {
    path: PathBuf,
    encoder: GzEncoder<BufWriter<File>>,
    count: usize,
}

impl GzJsonArrayWriter {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(b"[\n")?;
        Ok(Self {
            path: path.to_path_buf(),
            encoder,
            count: 0,
        })
    }

    pub fn write_item(&mut self, item: &Value) -> Result<()> {
        if self.count > 0 {
            self.encoder.write_all(b",\n")?;
        }
        serde_json::to_writer_pretty(&mut self.encoder, item)?;
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the array and flush; returns the number of items written
    pub fn finish(mut self) -> Result<usize> {
        self.encoder.write_all(b"\n]")?;
        let mut inner = self.encoder.finish()?;
        inner.flush()?;
        Ok(self.count)
    }

    /// Drop the partial archive so the next run starts over
    pub fn abandon(self) -> Result<()> {
        let path = self.path.clone();
        drop(self);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Read a JSON array from a plain or `.gz` file
pub fn read_json_array(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    match serde_json::from_reader(reader)? {
        Value::Array(items) => Ok(items),
        _ => Err(ResearchError::InvalidData(format!(
            "{} does not contain a JSON array",
            path.display()
        ))),
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

/// Write a value pretty-printed, creating parent directories
pub fn write_json_pretty(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}
