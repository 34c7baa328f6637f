//! Plain-text rendering for framehouse output.

use framehouse_core::{Dataframe, TypeDescriptor};
use framehouse_metadata::VersionDoc;

/// Canonical text, stride and field offsets of a descriptor
pub fn describe_dtype(dtype: &TypeDescriptor) -> String {
    let mut out = format!("{dtype}\nitemsize: {}\n", dtype.itemsize());
    for (field, offset) in dtype.fields().iter().zip(dtype.offsets()) {
        out.push_str(&format!(
            "  {:<16} offset {:>6}  width {:>6}  {}\n",
            field.name,
            offset,
            field.dtype.itemsize(),
            field.dtype
        ));
    }
    out
}

pub fn describe_version(version: &VersionDoc) -> String {
    let chain = version
        .base_version_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Symbol:   {}\n\
         Version:  {}\n\
         Rows:     {}\n\
         Segments: {}\n\
         Appends:  {}\n\
         Index:    {}\n\
         Columns:  {}\n\
         Dtype:    {}\n\
         Chain:    {}\n\
         Sha:      {}\n",
        version.symbol,
        version.version,
        version.up_to,
        version.segment_count,
        version.append_count,
        version.index_name().unwrap_or("-"),
        version.dtype_metadata.columns.join(", "),
        version.dtype,
        chain,
        version.sha.as_deref().unwrap_or("-"),
    )
}

/// Tab-separated header plus one line per row
pub fn render_rows(df: &Dataframe, limit: usize) -> String {
    let mut out = df.column_names().join("\t");
    out.push('\n');
    for row in 0..df.len().min(limit) {
        let cells: Vec<String> = df
            .columns()
            .iter()
            .map(|c| c.get(row).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}
