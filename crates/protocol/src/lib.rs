//! Request, event and result shapes exchanged between the upload pipeline
//! and the UI process that drives it.

pub mod messages;
pub mod types;

pub use messages::{BatchUploadRequest, RequestError, UnitErrorEvent, UploadOutcome, UploadRequest};
pub use types::{
    ConnectionCredentials, DEFAULT_SSH_PORT, ProgressEvent, UnitStatus, UploadStage, percentage,
};
