//! Handling of a single `/mutate` request, from raw body to HTTP response.
use k8s_openapi::api::core::v1::Service;
use kube::core::{admission::AdmissionRequest, DynamicObject};
use kube::ResourceExt;
use warp::http::{header::CONTENT_TYPE, StatusCode};
use warp::reply::{self, Reply, Response};

use crate::decode;
use crate::error::HijackError;
use crate::planner::PatchPlanner;
use crate::response::{self, Outcome};
use crate::validate;

/// Turns the request body into an HTTP response.
///
/// Only an empty body or a wrong Content-Type produce a plain HTTP error. Everything else is
/// answered with an AdmissionReview, denied when something went wrong.
pub fn mutate(body: &[u8], content_type: Option<&str>, planner: &dyn PatchPlanner) -> Response {
    let request = match decode::admission_request(body, content_type) {
        Ok(request) => request,
        Err(err) => {
            tracing::error!("{}", err);
            return match err.transport_status() {
                Some(status) => reply::with_status(err.to_string(), status).into_response(),
                None => write_review(&response::invalid(&err)),
            };
        }
    };

    let outcome = review(&request, planner);
    write_review(&response::assemble(&request, outcome))
}

/// Runs the decoded request through decoding of the object, validation and planning.
pub fn review(request: &AdmissionRequest<DynamicObject>, planner: &dyn PatchPlanner) -> Outcome {
    let svc = match decode::service(request) {
        Ok(svc) => svc,
        Err(err) => {
            tracing::error!("{}", err);
            return Outcome::Rejected(err);
        }
    };

    log_request(request, &svc);

    if let Err(err) = validate::service(&svc) {
        tracing::warn!("Error validating service: {}", err);
        return Outcome::Rejected(err);
    }

    match planner.plan(&svc) {
        Ok(patches) => {
            tracing::debug!(
                "Patch for service {} in namespace {:?}: {:?}",
                svc.name_any(),
                svc.namespace(),
                patches
            );
            Outcome::from_plan(patches)
        }
        Err(err) => {
            tracing::error!("Error planning patch: {:?}", err);
            Outcome::Rejected(HijackError::Planning(err))
        }
    }
}

fn log_request(request: &AdmissionRequest<DynamicObject>, svc: &Service) {
    tracing::info!(
        "AdmissionReview for Kind={:?}, Namespace={:?} Name={} ({}) UID={} Operation={:?} UserInfo={:?}",
        request.kind,
        request.namespace,
        request.name,
        svc.name_any(),
        request.uid,
        request.operation,
        request.user_info,
    );
}

fn write_review<T: serde::Serialize>(review: &T) -> Response {
    match serde_json::to_vec(review) {
        Ok(body) => {
            tracing::trace!("Admission response: {}", String::from_utf8_lossy(&body));
            reply::with_header(body, CONTENT_TYPE, decode::JSON_CONTENT_TYPE).into_response()
        }
        Err(err) => {
            tracing::error!("Can't encode response: {:?}", err);
            reply::with_status(
                format!("could not encode response: {err}"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response()
        }
    }
}
