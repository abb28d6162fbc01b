//! Admission subjects: the workloads under review.
//!
//! A subject exposes only what the decision needs — its kind and name
//! for logging, and its container image references in declaration
//! order. Concrete workload kinds implement `AdmissionSubject`; the one
//! place that looks at the manifest's declared `kind` string is
//! `parse_subject`, at the decode boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SubjectError;

/// An opaque container image reference (registry host + repository +
/// tag or digest). Compared as a string; never canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap an image reference string.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageRef {
    fn from(reference: &str) -> Self {
        Self(reference.to_owned())
    }
}

impl From<String> for ImageRef {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/// A workload submitted for admission.
pub trait AdmissionSubject: Send + Sync + fmt::Debug {
    /// The workload kind, for logging and verdict text.
    fn kind(&self) -> &'static str;

    /// The workload's declared name.
    fn name(&self) -> &str;

    /// Container image references in declaration order.
    fn container_images(&self) -> Vec<ImageRef>;
}

/// Object metadata common to all workload kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Workload name.
    #[serde(default)]
    pub name: String,
    /// Namespace, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// A single container entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    /// Container name.
    #[serde(default)]
    pub name: String,
    /// Image reference.
    pub image: ImageRef,
}

/// The container-bearing part of a pod.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Containers in declaration order.
    #[serde(default)]
    pub containers: Vec<Container>,
}

/// A pod manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pod {
    /// Pod metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Pod spec.
    #[serde(default)]
    pub spec: PodSpec,
}

impl AdmissionSubject for Pod {
    fn kind(&self) -> &'static str {
        "Pod"
    }

    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn container_images(&self) -> Vec<ImageRef> {
        self.spec.containers.iter().map(|c| c.image.clone()).collect()
    }
}

/// Pod template nested inside templated workloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodTemplateSpec {
    /// The templated pod spec.
    #[serde(default)]
    pub spec: PodSpec,
}

/// Spec of a workload that stamps out pods from a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatedSpec {
    /// The pod template.
    #[serde(default)]
    pub template: PodTemplateSpec,
}

/// A deployment manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Deployment spec.
    #[serde(default)]
    pub spec: TemplatedSpec,
}

impl AdmissionSubject for Deployment {
    fn kind(&self) -> &'static str {
        "Deployment"
    }

    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn container_images(&self) -> Vec<ImageRef> {
        self.spec
            .template
            .spec
            .containers
            .iter()
            .map(|c| c.image.clone())
            .collect()
    }
}

/// A stateful set manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatefulSet {
    /// Stateful set metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Stateful set spec.
    #[serde(default)]
    pub spec: TemplatedSpec,
}

impl AdmissionSubject for StatefulSet {
    fn kind(&self) -> &'static str {
        "StatefulSet"
    }

    fn name(&self) -> &str {
        &self.metadata.name
    }

    fn container_images(&self) -> Vec<ImageRef> {
        self.spec
            .template
            .spec
            .containers
            .iter()
            .map(|c| c.image.clone())
            .collect()
    }
}

/// Decode a workload manifest into an admission subject, dispatching on
/// the manifest's declared `kind`.
///
/// # Errors
///
/// `SubjectError::MissingKind` / `UnsupportedKind` when the kind is
/// absent or not reviewed here; `SubjectError::Decode` when the body
/// does not decode as the declared kind.
pub fn parse_subject(manifest: &str) -> Result<Box<dyn AdmissionSubject>, SubjectError> {
    #[derive(Deserialize)]
    struct KindProbe {
        #[serde(default)]
        kind: Option<String>,
    }

    let probe: KindProbe = serde_json::from_str(manifest)?;
    match probe.kind.as_deref() {
        Some("Pod") => Ok(Box::new(serde_json::from_str::<Pod>(manifest)?)),
        Some("Deployment") => Ok(Box::new(serde_json::from_str::<Deployment>(manifest)?)),
        Some("StatefulSet") => Ok(Box::new(serde_json::from_str::<StatefulSet>(manifest)?)),
        Some(kind) => Err(SubjectError::UnsupportedKind(kind.to_owned())),
        None => Err(SubjectError::MissingKind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_images_in_declaration_order() {
        let manifest = r#"{
            "kind": "Pod",
            "metadata": { "name": "web" },
            "spec": { "containers": [
                { "name": "app", "image": "reg/app:1" },
                { "name": "sidecar", "image": "reg/sidecar:2" }
            ]}
        }"#;

        let subject = parse_subject(manifest).expect("parses");
        assert_eq!(subject.kind(), "Pod");
        assert_eq!(subject.name(), "web");
        let images: Vec<String> = subject
            .container_images()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(images, vec!["reg/app:1", "reg/sidecar:2"]);
    }

    #[test]
    fn deployment_images_from_template() {
        let manifest = r#"{
            "kind": "Deployment",
            "metadata": { "name": "api" },
            "spec": { "template": { "spec": { "containers": [
                { "name": "api", "image": "reg/api@sha256:abc" }
            ]}}}
        }"#;

        let subject = parse_subject(manifest).expect("parses");
        assert_eq!(subject.kind(), "Deployment");
        assert_eq!(subject.container_images(), vec![ImageRef::from("reg/api@sha256:abc")]);
    }

    #[test]
    fn statefulset_parses() {
        let manifest = r#"{
            "kind": "StatefulSet",
            "metadata": { "name": "db" },
            "spec": { "template": { "spec": { "containers": [
                { "name": "db", "image": "reg/db:9" }
            ]}}}
        }"#;

        let subject = parse_subject(manifest).expect("parses");
        assert_eq!(subject.kind(), "StatefulSet");
        assert_eq!(subject.name(), "db");
    }

    #[test]
    fn unsupported_kind_rejected() {
        let err = parse_subject(r#"{"kind": "DaemonSet"}"#).expect_err("must fail");
        assert!(matches!(err, SubjectError::UnsupportedKind(k) if k == "DaemonSet"));
    }

    #[test]
    fn missing_kind_rejected() {
        let err = parse_subject(r#"{"metadata": {"name": "x"}}"#).expect_err("must fail");
        assert!(matches!(err, SubjectError::MissingKind));
    }

    #[test]
    fn empty_pod_has_no_images() {
        let subject = parse_subject(r#"{"kind": "Pod"}"#).expect("parses");
        assert!(subject.container_images().is_empty());
    }
}
