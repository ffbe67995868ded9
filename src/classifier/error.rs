use std::fmt;

/// Represents the different types of errors that can occur in the image classifier.
///
/// Every error is call-scoped: it is returned to the caller of `classify` and
/// never crashes the process. The enum is `Clone` because a load failure is
/// recorded once on the shared model handle and then surfaced to every
/// subsequent call.
#[derive(Debug, Clone)]
pub enum ClassifierError {
    /// Missing or unusable model locator at construction time. Permanent;
    /// never retried by the readiness gate.
    Config(String),
    /// The model failed to load (I/O, parse, or runtime failure). Stored on
    /// the model handle and surfaced to every subsequent call without
    /// retrying the load.
    ModelLoad(String),
    /// The model was still loading when the readiness wait ran out of
    /// attempts. Only the call that waited sees this.
    Timeout {
        /// Number of readiness polls performed before giving up.
        attempts: u32,
    },
    /// The image locator failed variant classification, or the referenced
    /// input could not be read. Raised before any decode is attempted.
    InvalidInput(String),
    /// Unrecognized content type or codec failure while decoding the image.
    Decode(String),
    /// Failure during preprocessing or model execution.
    Inference(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::ModelLoad(msg) => write!(f, "Model load error: {}", msg),
            Self::Timeout { attempts } => {
                write!(f, "Model still loading after {} attempts", attempts)
            }
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Decode(msg) => write!(f, "Decode error: {}", msg),
            Self::Inference(msg) => write!(f, "Inference error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<ort::Error> for ClassifierError {
    fn from(err: ort::Error) -> Self {
        ClassifierError::Inference(err.to_string())
    }
}
