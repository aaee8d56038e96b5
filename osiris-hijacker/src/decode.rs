//! Strict decoding of the AdmissionReview envelope and the Service it carries.
use k8s_openapi::api::core::v1::Service;
use kube::core::{
    admission::{AdmissionRequest, AdmissionReview},
    DynamicObject,
};

use crate::error::HijackError;

/// The only media type accepted on the mutate route.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Checks the transport level properties of the request and decodes the AdmissionReview.
///
/// An empty body or a Content-Type other than exactly `application/json` are reported before
/// the body is looked at, since nothing useful can be answered to such a request.
pub fn admission_request(
    body: &[u8],
    content_type: Option<&str>,
) -> Result<AdmissionRequest<DynamicObject>, HijackError> {
    if body.is_empty() {
        return Err(HijackError::EmptyBody);
    }

    if content_type != Some(JSON_CONTENT_TYPE) {
        return Err(HijackError::UnsupportedContentType(
            content_type.unwrap_or_default().to_string(),
        ));
    }

    let review: AdmissionReview<DynamicObject> = serde_json::from_slice(body)
        .map_err(|err| HijackError::MalformedEnvelope(err.to_string()))?;

    review
        .try_into()
        .map_err(|err: kube::core::admission::ConvertAdmissionReviewError| {
            HijackError::MalformedEnvelope(err.to_string())
        })
}

/// Extracts the Service under review from a decoded request.
pub fn service(request: &AdmissionRequest<DynamicObject>) -> Result<Service, HijackError> {
    request
        .object
        .clone()
        .ok_or_else(|| HijackError::MalformedObject("no object in request".to_string()))?
        .try_parse()
        .map_err(|err| HijackError::MalformedObject(err.to_string()))
}
