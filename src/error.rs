use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading a JSONL transcript. Any of these aborts the whole
/// conversion; there is no partial load.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: malformed record", .path.display())]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while turning pages into book files.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("rendering template {name}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("serializing book.toml")]
    Config(#[from] toml::ser::Error),
}
