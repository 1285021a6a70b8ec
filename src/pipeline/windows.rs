//! Tiling of reference regions into overlapping padded windows

use serde::Serialize;

use crate::config::AssemblyConfig;
use crate::error::{MicroassemblerError, Result};

/// One unit of work: a padded stretch of one contig, 1-based inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub chrom: String,
    pub start: usize,
    pub end: usize,
    /// Unpadded part of the window
    pub core_start: usize,
    pub core_end: usize,
}

impl Window {
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// A region as given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub chrom: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl std::str::FromStr for Region {
    type Err = MicroassemblerError;

    /// Parse `chr`, `chr:start` or `chr:start-end`, commas allowed in numbers
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MicroassemblerError::InvalidRegion(s.to_string());
        let parse = |n: &str| n.replace(',', "").parse::<usize>().map_err(|_| invalid());
        let Some((chrom, range)) = s.rsplit_once(':') else {
            return Ok(Region { chrom: s.to_string(), start: None, end: None });
        };
        if chrom.is_empty() {
            return Err(invalid());
        }
        let (start, end) = match range.split_once('-') {
            Some((a, b)) => (parse(a)?, Some(parse(b)?)),
            None => (parse(range)?, None),
        };
        if start == 0 || end.map_or(false, |e| e < start) {
            return Err(invalid());
        }
        Ok(Region { chrom: chrom.to_string(), start: Some(start), end })
    }
}

/// Split `region` of a contig of length `contig_len` into windows of
/// `window_size` bases every `window_step` bases, padded on both sides
pub fn tile_region(region: &Region, contig_len: usize, config: &AssemblyConfig) -> Result<Vec<Window>> {
    let start = region.start.unwrap_or(1);
    let end = region.end.unwrap_or(contig_len).min(contig_len);
    if contig_len == 0 || start > end {
        return Err(MicroassemblerError::InvalidRegion(format!(
            "{}:{}-{} outside contig of length {}",
            region.chrom, start, end, contig_len
        )));
    }

    let mut windows = Vec::new();
    let mut core_start = start;
    loop {
        let core_end = (core_start + config.window_size - 1).min(end);
        windows.push(Window {
            chrom: region.chrom.clone(),
            start: core_start.saturating_sub(config.padding).max(1),
            end: (core_end + config.padding).min(contig_len),
            core_start,
            core_end,
        });
        if core_end == end {
            break;
        }
        core_start += config.window_step;
    }
    Ok(windows)
}
