use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("post not found: {0}")]
    NotFound(String),
    #[error("invalid post filename: {0}")]
    InvalidFilename(String),
    #[error("invalid front matter in {filename}: {source}")]
    FrontMatter {
        filename: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("malformed deleted posts list: {0}")]
    Tombstones(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn front_matter(filename: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::FrontMatter {
            filename: filename.into(),
            source,
        }
    }
}
