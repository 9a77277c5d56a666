//! On-disk layout for downloaded data
//!
//! ```text
//! events/events_0000.json            one Gamma page per file
//! trades/trades_NNN/trades_<cid>.json.gz
//! trades/no_data.txt
//! prices/prices_NNN/prices_<token>.json
//! prices/no_data.txt
//! outputs/...
//! ```
//!
//! `NNN` is the id modulo the bucket modulus: condition ids are read as
//! hexadecimal, token ids as decimal. Ids that do not parse land in
//! `*_misc`.

pub mod archive;
pub mod registry;


pub use archive::{read_json_array, write_json_pretty, GzJsonArrayWriter};
pub use registry::NoDataRegistry;

use crate::config::StorageConfig;
use crate::error::Result;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const NO_DATA_FILE: &str = "no_data.txt";

/// `id mod modulus` for an arbitrarily long hexadecimal id (optional `0x`)
pub fn bucket_for_hex(id: &str, modulus: u32) -> Option<u32> {
    let id = id.trim();
    let digits = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .unwrap_or(id);
    bucket_for_radix(digits, 16, modulus)
}

/// `id mod modulus` for an arbitrarily long decimal id
pub fn bucket_for_decimal(id: &str, modulus: u32) -> Option<u32> {
    bucket_for_radix(id.trim(), 10, modulus)
}

fn bucket_for_radix(digits: &str, radix: u32, modulus: u32) -> Option<u32> {
    if digits.is_empty() || modulus == 0 {
        return None;
    }
    let m = modulus as u64;
    let mut rem = 0u64;
    for c in digits.chars() {
        let d = c.to_digit(radix)? as u64;
        rem = (rem * radix as u64 + d) % m;
    }
    Some(rem as u32)
}

/// Resolved directories plus the naming rules for every file kind
#[derive(Debug, Clone)]
pub struct DataLayout {
    pub events_dir: PathBuf,
    pub trades_dir: PathBuf,
    pub prices_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub modulus: u32,
}

impl DataLayout {
    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            events_dir: config.events_path(),
            trades_dir: config.trades_path(),
            prices_dir: config.prices_path(),
            outputs_dir: config.outputs_path(),
            modulus: config.bucket_modulus,
        }
    }

    /// Layout rooted at `root` with default directory names
    pub fn rooted(root: &Path) -> Self {
        Self {
            events_dir: root.join("events"),
            trades_dir: root.join("trades"),
            prices_dir: root.join("prices"),
            outputs_dir: root.join("outputs"),
            modulus: 1000,
        }
    }

    // ---- events ----

    pub fn event_file(&self, index: usize) -> PathBuf {
        self.events_dir.join(format!("events_{:04}.json", index))
    }

    /// `events_*.json` files in name order
    pub fn event_files(&self) -> Result<Vec<PathBuf>> {
        list_files(&self.events_dir, "events_", &[".json"])
    }

    /// Offset and file index to resume an event download from
    pub fn events_resume_state(&self, page_limit: usize) -> Result<(usize, usize)> {
        let max_index = self
            .event_files()?
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .filter_map(|name| strip_affixes(name, "events_", &[".json"]))
            .filter_map(|idx| idx.parse::<usize>().ok())
            .max();

        Ok(match max_index {
            None => (0, 0),
            Some(max) => {
                let next = max + 1;
                (next * page_limit, next)
            }
        })
    }

    // ---- trades ----

    pub fn trade_bucket(&self, condition_id: &str) -> PathBuf {
        match bucket_for_hex(condition_id, self.modulus) {
            Some(b) => self.trades_dir.join(format!("trades_{:03}", b)),
            None => self.trades_dir.join("trades_misc"),
        }
    }

    pub fn trade_file(&self, condition_id: &str) -> PathBuf {
        self.trade_bucket(condition_id)
            .join(format!("trades_{}.json.gz", condition_id))
    }

    /// Existing trade file for a market, compressed or plain
    pub fn find_trade_file(&self, condition_id: &str) -> Option<PathBuf> {
        let gz = self.trade_file(condition_id);
        if gz.is_file() {
            return Some(gz);
        }
        let plain = self
            .trade_bucket(condition_id)
            .join(format!("trades_{}.json", condition_id));
        plain.is_file().then_some(plain)
    }

    /// Every trade archive in every bucket
    pub fn trade_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for dir in list_dirs(&self.trades_dir, "trades_")? {
            files.extend(list_files(&dir, "trades_", &[".json.gz", ".json"])?);
        }
        files.sort();
        Ok(files)
    }

    pub fn trades_no_data(&self) -> NoDataRegistry {
        NoDataRegistry::new(self.trades_dir.join(NO_DATA_FILE))
    }

    /// Markets already downloaded or known to have no trades
    pub fn processed_trade_markets(&self) -> Result<HashSet<String>> {
        let mut processed: HashSet<String> = self
            .trade_files()?
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .filter_map(|name| strip_affixes(name, "trades_", &[".json.gz", ".json"]))
            .map(str::to_string)
            .collect();
        processed.extend(self.trades_no_data().load()?);
        Ok(processed)
    }

    // ---- prices ----

    pub fn price_bucket(&self, token_id: &str) -> PathBuf {
        match bucket_for_decimal(token_id, self.modulus) {
            Some(b) => self.prices_dir.join(format!("prices_{:03}", b)),
            None => self.prices_dir.join("prices_misc"),
        }
    }

    pub fn price_file(&self, token_id: &str) -> PathBuf {
        self.price_bucket(token_id)
            .join(format!("prices_{}.json", token_id))
    }

    /// Existing history file for a token, including legacy root-level files
    pub fn find_price_file(&self, token_id: &str) -> Option<PathBuf> {
        let bucketed = self.price_file(token_id);
        if bucketed.is_file() {
            return Some(bucketed);
        }
        let legacy = self.prices_dir.join(format!("prices_{}.json", token_id));
        legacy.is_file().then_some(legacy)
    }

    /// Every price file in buckets and at the prices root
    pub fn price_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = list_files(&self.prices_dir, "prices_", &[".json"])?;
        for dir in list_dirs(&self.prices_dir, "prices_")? {
            files.extend(list_files(&dir, "prices_", &[".json"])?);
        }
        files.sort();
        Ok(files)
    }

    pub fn prices_no_data(&self) -> NoDataRegistry {
        NoDataRegistry::new(self.prices_dir.join(NO_DATA_FILE))
    }

    /// Tokens already downloaded or known to have no history
    pub fn processed_price_tokens(&self) -> Result<HashSet<String>> {
        let mut processed: HashSet<String> = self
            .price_files()?
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .filter_map(|name| strip_affixes(name, "prices_", &[".json"]))
            .map(str::to_string)
            .collect();
        processed.extend(self.prices_no_data().load()?);
        Ok(processed)
    }

    /// Token id encoded in a price file name
    pub fn token_from_price_file(path: &Path) -> Option<String> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|name| strip_affixes(name, "prices_", &[".json"]))
            .map(str::to_string)
    }

    /// Condition id encoded in a trade file name
    pub fn market_from_trade_file(path: &Path) -> Option<String> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|name| strip_affixes(name, "trades_", &[".json.gz", ".json"]))
            .map(str::to_string)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.events_dir, &self.trades_dir, &self.prices_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// `name` without `prefix` and the first matching suffix
fn strip_affixes<'a>(name: &'a str, prefix: &str, suffixes: &[&str]) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    suffixes
        .iter()
        .find_map(|s| rest.strip_suffix(s))
        .filter(|id| !id.is_empty())
}

/// Regular files in `dir` named `prefix*suffix`, sorted; missing dir → empty
fn list_files(dir: &Path, prefix: &str, suffixes: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| strip_affixes(n, prefix, suffixes).is_some())
            .unwrap_or(false);
        if matches {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Subdirectories of `dir` whose names start with `prefix`
fn list_dirs(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let named = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(prefix))
            .unwrap_or(false);
        if named && path.is_dir() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}
