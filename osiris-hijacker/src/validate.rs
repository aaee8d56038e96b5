use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;

use crate::annotations;
use crate::error::HijackError;

/// An Osiris-enabled Service must name the Deployment or StatefulSet that backs it,
/// otherwise the endpoints controller has no way to find its pods.
/// Services that are not Osiris-enabled are not checked.
pub fn service(svc: &Service) -> Result<(), HijackError> {
    let annotations = svc.annotations();

    if annotations::is_eligible(annotations) && !annotations::has_owner(annotations) {
        return Err(HijackError::MissingOwnerAnnotation {
            name: svc.name_any(),
            namespace: svc.namespace().unwrap_or_default(),
        });
    }

    Ok(())
}
