//! Mapping of SDK failures into [`SourceError`].

use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use cs_error::SourceError;

/// Service error codes that mean the named resource does not exist.
const NOT_FOUND_CODES: &[&str] = &[
    "ResourceNotFoundException",
    "QueueDoesNotExist",
    "AWS.SimpleQueueService.NonExistentQueue",
    "NoSuchEntity",
];

/// Whether a service error code denotes a missing resource.
pub fn is_not_found_code(code: Option<&str>) -> bool {
    code.is_some_and(|code| NOT_FOUND_CODES.contains(&code))
}

/// Classify an SDK error raised by `operation`.
///
/// Missing resources become [`SourceError::NotFound`], responses that could
/// not be read become [`SourceError::MalformedResponse`], everything else is
/// [`SourceError::Transient`].
pub fn classify_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> SourceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    let message = format!("{operation} failed: {}", DisplayErrorContext(&err));

    match &err {
        SdkError::ServiceError(service) if is_not_found_code(service.err().code()) => {
            SourceError::NotFound(message)
        }
        SdkError::ResponseError(_) | SdkError::ConstructionFailure(_) => {
            SourceError::MalformedResponse(message)
        }
        _ => SourceError::Transient(message),
    }
}
