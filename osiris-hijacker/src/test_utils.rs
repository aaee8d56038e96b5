//! Fixtures shared by the unit tests.
use json_patch::{AddOperation, PatchOperation};
use jsonptr::Pointer;
use k8s_openapi::api::core::v1::Service;
use serde_json::{json, Value};

use crate::planner::PatchPlanner;

pub const UID: &str = "705ab4f5-6393-11e8-b7cc-42010a800002";

/// A Service manifest named `web` in namespace `shop`.
pub fn service_object(annotations: Value, selector: Value) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": "web",
            "namespace": "shop",
            "annotations": annotations,
        },
        "spec": {
            "selector": selector,
            "ports": [{ "port": 80, "targetPort": 8080, "protocol": "TCP" }],
        },
    })
}

pub fn service(annotations: Value, selector: Value) -> Service {
    serde_json::from_value(service_object(annotations, selector)).unwrap()
}

/// An AdmissionReview v1 request for creating the given object.
pub fn review(object: Value) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": UID,
            "kind": { "group": "", "version": "v1", "kind": "Service" },
            "resource": { "group": "", "version": "v1", "resource": "services" },
            "requestKind": { "group": "", "version": "v1", "kind": "Service" },
            "requestResource": { "group": "", "version": "v1", "resource": "services" },
            "name": "web",
            "namespace": "shop",
            "operation": "CREATE",
            "userInfo": {
                "username": "kubernetes-admin",
                "groups": ["system:masters", "system:authenticated"],
            },
            "object": object,
            "oldObject": null,
            "dryRun": false,
            "options": { "kind": "CreateOptions", "apiVersion": "meta.k8s.io/v1" },
        },
    })
}

/// Always answers with the same patch, whatever the Service.
pub struct FixedPlanner(pub Vec<PatchOperation>);

impl PatchPlanner for FixedPlanner {
    fn plan(&self, _svc: &Service) -> anyhow::Result<Vec<PatchOperation>> {
        Ok(self.0.clone())
    }
}

/// Always fails.
pub struct FailingPlanner;

impl PatchPlanner for FailingPlanner {
    fn plan(&self, _svc: &Service) -> anyhow::Result<Vec<PatchOperation>> {
        Err(anyhow::anyhow!("planner exploded"))
    }
}

pub fn label_patch() -> Vec<PatchOperation> {
    vec![PatchOperation::Add(AddOperation {
        path: Pointer::new(["metadata", "labels", "osiris.dm.gg/hijacked"]),
        value: json!("true"),
    })]
}
