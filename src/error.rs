#[derive(thiserror::Error, Debug)]
pub enum Error {
    // --- boundary kinds (spec §7) ---
    #[error("InvalidFormat => {0}")]
    InvalidFormat(HeaderErrorType),
    #[error("NoSuchStream => directory index {0} is not a stream")]
    NoSuchStream(usize),
    #[error("VersionMismatch => {0}")]
    VersionMismatch(&'static str),
    #[error("Truncated => {0}")]
    Truncated(&'static str),
    #[error("parser has been closed")]
    Closed,

    // --- directory/allocation diagnostics, carried from the teacher ---
    #[error("InvalidDirectoryEntry => field {0}: {1}")]
    InvalidDirectoryEntry(&'static str, String),
    #[error("DirectoryEntryNotFound")]
    DirectoryEntryNotFound,
    #[error("InvalidPropertySet => {0}")]
    InvalidPropertySet(&'static str),

    // --- std errors ---
    #[error("Io => {0}")]
    Io(#[from] std::io::Error),
    #[error("FromUtf16 => {0}")]
    FromUtf16(#[from] std::string::FromUtf16Error),
}

#[derive(thiserror::Error, Debug)]
pub enum HeaderErrorType {
    #[error("the magic number was expected but not found, found {0:?} instead")]
    WrongMagicBytes(Vec<u8>),
    #[error("tried to read {0} bytes, found {1} bytes")]
    NotEnoughBytes(usize, usize),
    #[error("field {0}: {1}")]
    Parsing(&'static str, String),
}
