//! Computation of the JSON patch applied to an admitted Service.
use std::collections::BTreeMap;

use anyhow::Context;
use json_patch::{AddOperation, PatchOperation, RemoveOperation};
use jsonptr::Pointer;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use serde_json::json;

use crate::annotations;

/// Decides which patch operations a validated Service needs.
///
/// Implementations must be deterministic and free of side effects: the same Service always
/// yields the same operations. An empty list means the Service is admitted unchanged.
pub trait PatchPlanner: Send + Sync {
    fn plan(&self, svc: &Service) -> anyhow::Result<Vec<PatchOperation>>;
}

/// Takes the selector away from Osiris-enabled Services so that the built-in endpoints
/// controller ignores them, and gives it back once a Service is no longer Osiris-enabled.
///
/// The selector is kept as JSON in the `osiris.dm.gg/selector` annotation, where the Osiris
/// endpoints controller reads it.
#[derive(Debug, Default, Clone)]
pub struct SelectorHijacker;

impl PatchPlanner for SelectorHijacker {
    fn plan(&self, svc: &Service) -> anyhow::Result<Vec<PatchOperation>> {
        let mut patches = Vec::new();

        if annotations::is_eligible(svc.annotations()) {
            hijack_selector(&mut patches, svc)?;
        } else {
            restore_selector(&mut patches, svc)?;
        }

        Ok(patches)
    }
}

fn selector(svc: &Service) -> Option<&BTreeMap<String, String>> {
    svc.spec
        .as_ref()
        .and_then(|spec| spec.selector.as_ref())
        .filter(|selector| !selector.is_empty())
}

/// Move spec.selector into the selector annotation
fn hijack_selector(patches: &mut Vec<PatchOperation>, svc: &Service) -> anyhow::Result<()> {
    let Some(selector) = selector(svc) else {
        return Ok(());
    };
    let selector_json = serde_json::to_string(selector).context("Failed to encode selector")?;

    // The annotations map always exists here, eligibility is read from it.
    patches.push(PatchOperation::Add(AddOperation {
        path: Pointer::new(["metadata", "annotations", annotations::SELECTOR]),
        value: json!(selector_json),
    }));
    patches.push(PatchOperation::Remove(RemoveOperation {
        path: Pointer::new(["spec", "selector"]),
    }));

    Ok(())
}

/// Move a previously hijacked selector back into spec.selector
fn restore_selector(patches: &mut Vec<PatchOperation>, svc: &Service) -> anyhow::Result<()> {
    let Some(stored) = svc.annotations().get(annotations::SELECTOR) else {
        return Ok(());
    };
    let selector: BTreeMap<String, String> = serde_json::from_str(stored)
        .with_context(|| format!("Invalid {} annotation {:?}", annotations::SELECTOR, stored))?;

    // `add` replaces a selector set while the Service was hijacked.
    patches.push(PatchOperation::Add(AddOperation {
        path: Pointer::new(["spec", "selector"]),
        value: json!(selector),
    }));
    patches.push(PatchOperation::Remove(RemoveOperation {
        path: Pointer::new(["metadata", "annotations", annotations::SELECTOR]),
    }));

    Ok(())
}
