//! Assembly of the AdmissionReview sent back to the API server.
use json_patch::{Patch, PatchOperation};
use kube::core::{
    admission::{
        AdmissionRequest, AdmissionResponse, AdmissionReview, META_API_VERSION_V1, META_KIND,
    },
    DynamicObject, TypeMeta,
};

use crate::error::HijackError;

/// What the pipeline decided for one request.
#[derive(Debug)]
pub enum Outcome {
    /// Deny the request with the error as the reason.
    Rejected(HijackError),
    /// Admit the object as is.
    Unchanged,
    /// Admit the object once the operations are applied. Never empty.
    Patched(Vec<PatchOperation>),
}

impl Outcome {
    pub fn from_plan(patches: Vec<PatchOperation>) -> Self {
        if patches.is_empty() {
            Outcome::Unchanged
        } else {
            Outcome::Patched(patches)
        }
    }
}

/// Builds the answer to a request whose envelope could be decoded. The request UID is echoed.
///
/// A patch that cannot be serialized denies the request rather than admitting the object
/// without its patch.
pub fn assemble(
    request: &AdmissionRequest<DynamicObject>,
    outcome: Outcome,
) -> AdmissionReview<DynamicObject> {
    let response = AdmissionResponse::from(request);

    let response = match outcome {
        Outcome::Rejected(err) => response.deny(err.to_string()),
        Outcome::Unchanged => response,
        Outcome::Patched(patches) => match response.clone().with_patch(Patch(patches)) {
            Ok(patched) => patched,
            Err(err) => {
                tracing::error!("Can't encode patch: {:?}", err);
                response.deny(format!("{err:#}"))
            }
        },
    };

    into_v1_review(response)
}

/// Builds the answer to a request whose envelope could not be decoded. There is no UID to
/// echo, so none is set.
pub fn invalid(err: &HijackError) -> AdmissionReview<DynamicObject> {
    into_v1_review(AdmissionResponse::invalid(err))
}

/// Responses always go out as `admission.k8s.io/v1`, whatever version the request used.
fn into_v1_review(response: AdmissionResponse) -> AdmissionReview<DynamicObject> {
    let mut review = response.into_review();
    review.types = TypeMeta {
        api_version: META_API_VERSION_V1.to_owned(),
        kind: META_KIND.to_owned(),
    };
    review
}
