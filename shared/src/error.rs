use std::fmt;

/// Failures the page can report about itself. Browser capability failures
/// (clipboard, playback) are not errors here; they end up as notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum PageError {
    /// An anchor the page cannot run without is missing from the document.
    MissingAnchor(&'static str),
    /// An anchor exists but is not the element type the page expects.
    WrongAnchorType(&'static str),
    Config(String),
    Storage(String),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAnchor(id) => write!(f, "required element #{} not found", id),
            Self::WrongAnchorType(id) => write!(f, "element #{} has an unexpected type", id),
            Self::Config(msg) => write!(f, "invalid page config: {}", msg),
            Self::Storage(msg) => write!(f, "storage unavailable: {}", msg),
        }
    }
}

impl std::error::Error for PageError {}

impl From<serde_json::Error> for PageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
