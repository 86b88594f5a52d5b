use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Duplicate source key {0} in the name mapping")]
    DuplicateMappingKey(String),
    #[error("Unknown URI format: {0}")]
    UnknownUri(String),
    #[error("Environment variable {0} referenced by credential_reference is not set")]
    MissingCredential(String),
    #[error("Invalid mapping pair {0}, expected SOURCE=DESTINATION")]
    InvalidMappingPair(String),
}
