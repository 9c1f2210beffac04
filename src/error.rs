use thiserror::Error;

/// Failures the extraction core can report for a single page.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no content container (div.mw-parser-output) found in page")]
    ContainerNotFound,
}
