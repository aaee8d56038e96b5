use thiserror::Error;
use warp::http::StatusCode;

/// The ways handling a single admission request can fail.
#[derive(Debug, Error)]
pub enum HijackError {
    #[error("empty body")]
    EmptyBody,

    #[error("invalid Content-Type {0:?}, expect `application/json`")]
    UnsupportedContentType(String),

    #[error("can't decode body: {0}")]
    MalformedEnvelope(String),

    #[error("could not unmarshal raw object: {0}")]
    MalformedObject(String),

    #[error(
        "Osiris-enabled service {name} in namespace {namespace} is lacking the required \
         \"osiris.dm.gg/deployment\" or \"osiris.dm.gg/statefulset\" annotation"
    )]
    MissingOwnerAnnotation { name: String, namespace: String },

    #[error("could not compute patch operations: {0:#}")]
    Planning(anyhow::Error),
}

impl HijackError {
    /// Errors that are answered with a plain HTTP status instead of an AdmissionReview,
    /// because no request UID is available yet.
    pub fn transport_status(&self) -> Option<StatusCode> {
        match self {
            HijackError::EmptyBody => Some(StatusCode::BAD_REQUEST),
            HijackError::UnsupportedContentType(_) => Some(StatusCode::UNSUPPORTED_MEDIA_TYPE),
            _ => None,
        }
    }
}
