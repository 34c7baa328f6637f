//! Read path of the segment store.
//!
//! ```text
//! version.up_to - 1 ──► segment ending there ──► step back by its row count
//!                       ──► segment ending there ──► ... ──► row 0
//! ```
//!
//! Only segments whose `parent` holds the version's chain id are fetched.
//! When several segments end at the same offset, the one written by the live
//! version wins, then the latest to arrive. Segments the walk never reaches
//! are orphans of lost races and are skipped.

use std::collections::{HashMap, HashSet};

use framehouse_core::{ColumnCodec, Dataframe, Error as CoreError, TypeDescriptor};
use framehouse_metadata::{SegmentDoc, SegmentFilter, VersionDoc};

use crate::block;
use crate::checksum;
use crate::error::{Error, Result};
use crate::segment_index::SegmentIndex;
use crate::store::{DateRange, ReadOptions, SegmentStore};

impl SegmentStore {
    /// Read every row of the live version of `symbol`.
    pub async fn read(&self, symbol: &str) -> Result<Dataframe> {
        self.read_with(symbol, ReadOptions::default()).await
    }

    /// Read `symbol`, optionally pinned to a version and limited to a date range.
    #[tracing::instrument(skip(self))]
    pub async fn read_with(&self, symbol: &str, options: ReadOptions) -> Result<Dataframe> {
        let version = self.resolve_version(symbol, options.version).await?;
        let dtype = TypeDescriptor::parse(&version.dtype)?;

        let span = match options.range {
            Some(range) => self.rows_for_range(&version, &range)?,
            None => version.up_to.checked_sub(1).map(|last| (0, last)),
        };

        let mut df = match span {
            Some((first_row, last_row)) => {
                self.read_rows(&version, &dtype, first_row, last_row)
                    .await?
            }
            None => ColumnCodec::decode(&[], &dtype, 0)?,
        };

        if let Some(index) = version.index_name() {
            df.set_index(index)?;
        }

        match options.range {
            Some(range) => filter_range(&df, &range),
            None => Ok(df),
        }
    }

    async fn resolve_version(&self, symbol: &str, requested: Option<u64>) -> Result<VersionDoc> {
        if let Some(version) = requested {
            if let Some(found) = self.metadata.find_version(symbol, version).await? {
                return Ok(found);
            }
            if self.metadata.latest_version(symbol).await?.is_some() {
                return Err(Error::VersionNotFound {
                    symbol: symbol.to_string(),
                    version,
                });
            }
        }

        self.metadata
            .latest_version(symbol)
            .await?
            .ok_or_else(|| Error::SymbolNotFound(symbol.to_string()))
    }

    /// Row span to fetch for a date range, `None` if no append can match.
    fn rows_for_range(&self, version: &VersionDoc, range: &DateRange) -> Result<Option<(u64, u64)>> {
        let Some(last_row) = version.up_to.checked_sub(1) else {
            return Ok(None);
        };

        let index = SegmentIndex::from_block(&version.segment_index)?;
        if index.is_empty() {
            return Ok(Some((0, last_row)));
        }

        let (start, end) = range.bounds_ns();
        Ok(index
            .rows_overlapping(start, end)
            .map(|(first, last)| (first, last.min(last_row))))
    }

    /// Fetch, verify and decode rows `first_row..=last_row` of `version`.
    ///
    /// The result starts at the beginning of the segment holding `first_row`.
    async fn read_rows(
        &self,
        version: &VersionDoc,
        dtype: &TypeDescriptor,
        first_row: u64,
        last_row: u64,
    ) -> Result<Dataframe> {
        let symbol = version.symbol.as_str();
        let filter = SegmentFilter::for_symbol(symbol)
            .with_parent(version.chain_id())
            .with_segment_range(Some(first_row), Some(last_row));

        let segments = self.metadata.find_segments(&filter).await?;
        tracing::debug!(
            symbol,
            version = version.version,
            first_row,
            last_row,
            fetched = segments.len(),
            "Fetched segments"
        );
        if segments.is_empty() {
            return Err(Error::NoSegmentsFound {
                symbol: symbol.to_string(),
                version: version.version,
            });
        }

        let stride = dtype.itemsize();
        if stride == 0 {
            return Err(CoreError::UnsupportedLayout(format!(
                "descriptor {} has zero width",
                version.dtype
            ))
            .into());
        }

        let by_end = latest_by_end(&segments, version);
        let mut used = HashSet::new();
        let mut blocks = Vec::new();
        let mut cursor = last_row;
        let first = loop {
            let segment = by_end
                .get(&cursor)
                .copied()
                .ok_or_else(|| Error::BrokenSegmentChain {
                    symbol: symbol.to_string(),
                    offset: cursor,
                })?;

            if self.config.verify_segment_hashes && !checksum::verify_segment(segment) {
                return Err(Error::SegmentHashMismatch {
                    symbol: symbol.to_string(),
                    segment: cursor,
                });
            }

            let bytes = block::decompress(&segment.data, block::compression_for(segment.compressed))?;
            if bytes.is_empty() || bytes.len() % stride != 0 {
                return Err(Error::Decompression(format!(
                    "segment ending at {cursor} holds {} bytes, not a whole number of {stride} byte rows",
                    bytes.len()
                )));
            }
            let rows = (bytes.len() / stride) as u64;
            let start = match (cursor + 1).checked_sub(rows) {
                Some(start) => start,
                None => {
                    return Err(Error::BrokenSegmentChain {
                        symbol: symbol.to_string(),
                        offset: cursor,
                    })
                }
            };

            used.insert(segment.id);
            blocks.push(bytes);

            if start <= first_row {
                break start;
            }
            cursor = start - 1;
        };

        let orphans = segments.iter().filter(|s| !used.contains(&s.id)).count();
        if orphans > 0 {
            tracing::warn!(
                symbol,
                version = version.version,
                orphans,
                "Skipped segments not reachable from the live version"
            );
        }

        let rows = (last_row + 1 - first) as usize;
        let mut packed = Vec::with_capacity(rows * stride);
        for bytes in blocks.iter().rev() {
            packed.extend_from_slice(bytes);
        }

        Ok(ColumnCodec::decode(&packed, dtype, rows)?)
    }
}

/// Segment chosen for each ending offset.
fn latest_by_end<'a>(
    segments: &'a [SegmentDoc],
    version: &VersionDoc,
) -> HashMap<u64, &'a SegmentDoc> {
    let mut by_end = HashMap::with_capacity(segments.len());
    for segment in segments {
        by_end.insert(segment.segment, segment);
    }
    // The live version's own segment beats a later orphan at the same offset
    if let Some(own) = segments
        .iter()
        .rev()
        .find(|s| s.parent.contains(&version.id))
    {
        by_end.insert(own.segment, own);
    }
    by_end
}

/// Rows whose index lies in `range`, inclusive.
fn filter_range(df: &Dataframe, range: &DateRange) -> Result<Dataframe> {
    let index = df.require_index()?;
    let times = index.as_datetime_ns().ok_or_else(|| CoreError::TypeMismatch {
        column: index.name().to_string(),
        expected: "M8[ns]".to_string(),
        actual: index.kind().code(),
    })?;

    let (start, end) = range.bounds_ns();
    let first = times.iter().position(|&t| t >= start);
    let last = times.iter().rposition(|&t| t <= end);

    Ok(match (first, last) {
        (Some(first), Some(last)) if first <= last => df.slice(first..last + 1),
        _ => df.slice(0..0),
    })
}
