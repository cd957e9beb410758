use crate::core::models::report::OverlapReport;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error writing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize overlap report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable destination for a finished [`OverlapReport`].
pub trait ResultSink {
    fn write(&self, report: &OverlapReport, path: &Path) -> Result<(), SinkError>;
}

/// Writes the report as a single JSON document.
///
/// The document is first written to a hidden sibling of `path` and then
/// renamed over it, so a failed write leaves any previous file untouched.
/// Non-finite scores (the NaN fill value) are written as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink {
    pub pretty: bool,
}

impl JsonSink {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

impl JsonSink {
    fn write_to(&self, report: &OverlapReport, tmp: &Path) -> Result<(), SinkError> {
        let io_err = |source: std::io::Error| SinkError::Io {
            path: tmp.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(File::create(tmp).map_err(io_err)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, report)?;
        } else {
            serde_json::to_writer(&mut writer, report)?;
        }
        writer.write_all(b"\n").map_err(io_err)?;
        let file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
        file.sync_all().map_err(io_err)
    }
}

impl ResultSink for JsonSink {
    fn write(&self, report: &OverlapReport, path: &Path) -> Result<(), SinkError> {
        let tmp = temp_sibling(path);
        let result = self.write_to(report, &tmp).and_then(|()| {
            fs::rename(&tmp, path).map_err(|source| SinkError::Io {
                path: path.to_path_buf(),
                source,
            })
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
}
