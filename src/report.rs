//! Semicolon-delimited rendering of a flattened report.

use crate::error::DigestError;
use crate::tree::{NodeKind, NodeRecord};
use std::io;

pub const HEADER: [&str; 3] = ["Type", "Source", "Digest"];

const INDENT: &str = "  ";

/// Render records as CSV, one line per node, header first.
///
/// File and directory sources are indented by depth and marked with `>`;
/// a batch line lists its paths as given. Fields holding the delimiter,
/// a quote, or a line break are quoted by the writer.
pub fn render_csv(records: &[NodeRecord]) -> Result<String, DigestError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(vec![]);
    writer.write_record(HEADER).map_err(io::Error::from)?;

    for record in records {
        let source = match record.kind {
            NodeKind::Directory | NodeKind::File => {
                format!("{}>{}", INDENT.repeat(record.depth), record.source)
            }
            _ => record.source.to_string(),
        };
        writer
            .write_record([
                record.kind.code(),
                source.as_str(),
                record.digest.as_deref().unwrap_or(""),
            ])
            .map_err(io::Error::from)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}
