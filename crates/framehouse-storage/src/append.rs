//! Append path of the segment store.
//!
//! One accepted append writes exactly one segment, then replaces the symbol's
//! version document:
//!
//! 1. Look up the live version, allocate the next version number
//! 2. Reject a descriptor that is not layout-equal to the stored one
//! 3. Trim rows whose time index is not newer than the stored segment index
//! 4. Encode, compress and hash the remaining rows, insert the segment
//! 5. Upsert the version with the new row count and segment index
//!
//! Nothing spans documents: a failure after step 4 leaves an orphan segment
//! that reads never reach.

use std::borrow::Cow;

use framehouse_core::{ColumnCodec, Dataframe, TypeDescriptor};
use framehouse_metadata::{DtypeMetadata, SegmentDoc, VersionDoc, DATAFRAME_KIND};
use uuid::Uuid;

use crate::block;
use crate::checksum;
use crate::error::{Error, Result};
use crate::segment_index::SegmentIndex;
use crate::store::{AppendOptions, SegmentStore};

impl SegmentStore {
    /// Append `df` using the store's configured options.
    pub async fn append(&self, symbol: &str, df: &Dataframe) -> Result<Option<VersionDoc>> {
        self.append_with(symbol, df, AppendOptions::from(&self.config))
            .await
    }

    /// Append `df` under `symbol`.
    ///
    /// Returns the new version, or `None` when there was nothing to write
    /// (an empty frame, or every row already stored). With chunking, the
    /// result is the last chunk's.
    #[tracing::instrument(skip(self, df), fields(rows = df.len()))]
    pub async fn append_with(
        &self,
        symbol: &str,
        df: &Dataframe,
        options: AppendOptions,
    ) -> Result<Option<VersionDoc>> {
        df.require_index()?;
        df.dtype().validate()?;
        if df.is_empty() {
            tracing::debug!(symbol, "Empty frame, nothing to append");
            return Ok(None);
        }

        if options.chunk_size > 0 && df.len() > options.chunk_size {
            tracing::debug!(
                symbol,
                rows = df.len(),
                chunk_size = options.chunk_size,
                "Splitting append into chunks"
            );
            let mut last = None;
            for chunk in df.chunks(options.chunk_size) {
                if let Some(version) = self
                    .append_segment(symbol, &chunk, options.skip_already_written)
                    .await?
                {
                    last = Some(version);
                }
            }
            return Ok(last);
        }

        self.append_segment(symbol, df, options.skip_already_written)
            .await
    }

    async fn append_segment(
        &self,
        symbol: &str,
        df: &Dataframe,
        skip_already_written: bool,
    ) -> Result<Option<VersionDoc>> {
        let previous = self.metadata.latest_version(symbol).await?;
        let version_number = self.metadata.next_version_number(symbol).await?;

        let dtype = df.dtype();
        if let Some(prev) = &previous {
            let stored = TypeDescriptor::parse(&prev.dtype)?;
            if !stored.layout_eq(&dtype) {
                return Err(Error::SchemaMismatch {
                    symbol: symbol.to_string(),
                    stored: prev.dtype.clone(),
                    incoming: dtype.to_string(),
                });
            }
        }

        let mut segment_index = match &previous {
            Some(prev) => SegmentIndex::from_block(&prev.segment_index)?,
            None => SegmentIndex::default(),
        };

        let mut frame = Cow::Borrowed(df);
        if skip_already_written {
            if let (Some(times), Some(stored)) = (df.time_index(), segment_index.last()) {
                match times.iter().position(|&t| t > stored.last_index_ns) {
                    None => {
                        tracing::info!(
                            symbol,
                            rows = df.len(),
                            last_stored_ns = stored.last_index_ns,
                            "All rows already written, skipping append"
                        );
                        return Ok(None);
                    }
                    Some(0) => {}
                    Some(first_new) => {
                        tracing::debug!(
                            symbol,
                            skipped = first_new,
                            kept = df.len() - first_new,
                            "Trimmed already written rows"
                        );
                        frame = Cow::Owned(df.slice(first_new..df.len()));
                    }
                }
            }
        }

        let rows = frame.len() as u64;
        let up_to = previous.as_ref().map_or(0, |p| p.up_to) + rows;
        let end_offset = up_to - 1;

        let segment_index = match frame.time_index().and_then(|t| t.last()) {
            Some(&last) => {
                segment_index.push(last, end_offset);
                segment_index.to_block()?
            }
            None => previous
                .as_ref()
                .map(|p| p.segment_index.clone())
                .unwrap_or_default(),
        };

        let encoded = ColumnCodec::encode(&frame)?;
        let compression = self.config.compression;
        let data = block::compress(&encoded, compression)?;
        let sha = match previous.as_ref().and_then(|p| p.sha.clone()) {
            Some(sha) => sha,
            None => checksum::content_hash(&encoded),
        };

        let id = Uuid::new_v4();
        let chain_id = previous.as_ref().map_or(id, VersionDoc::chain_id);
        let mut parent = vec![id];
        if chain_id != id {
            parent.push(chain_id);
        }

        let mut segment = SegmentDoc {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            data,
            compressed: compression.is_compressed(),
            segment: end_offset,
            parent,
            sha: String::new(),
        };
        segment.sha = checksum::segment_hash(&segment);
        let compressed_len = segment.data.len();
        self.metadata.insert_segment(segment).await?;

        let index_name = frame.index_name().unwrap_or_default().to_string();
        let version = VersionDoc {
            id,
            symbol: symbol.to_string(),
            version: version_number,
            dtype: previous
                .as_ref()
                .map_or_else(|| dtype.to_string(), |p| p.dtype.clone()),
            dtype_metadata: DtypeMetadata {
                index: vec![index_name],
                columns: frame.column_names(),
            },
            shape: vec![-1],
            kind: DATAFRAME_KIND.to_string(),
            segment_count: previous.as_ref().map_or(0, |p| p.segment_count) + 1,
            append_count: previous.as_ref().map_or(0, |p| p.append_count) + 1,
            up_to,
            segment_index,
            sha: Some(sha),
            base_version_id: Some(chain_id),
        };
        self.metadata.upsert_version(version.clone()).await?;

        tracing::info!(
            symbol,
            version = version.version,
            rows,
            up_to,
            bytes = encoded.len(),
            compressed_bytes = compressed_len,
            "Appended segment"
        );

        Ok(Some(version))
    }
}
