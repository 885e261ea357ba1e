use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Errors in a deployment template.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to parse deployment template: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Deployment template needs {expected} documents, found {found}")]
    DocumentCount { expected: usize, found: usize },
    #[error("First document of the template must be a {expected}, found {found}")]
    ConfigKind {
        expected: &'static str,
        found: String,
    },
    #[error("Consumer deployment '{0}' has no containers")]
    NoContainers(String),
    #[error("'{0}' is not a valid deployment name")]
    InvalidName(String),
    #[error("'{0}' is not a valid label value")]
    InvalidLabelValue(String),
}

/// Where the base URL lives in a rendered manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFlavour {
    /// A `ConfigMap` with `data.BASE_URL`, and each consumer pod labelled `base-url`.
    K8sNative,
    /// An `ExternalName` `Service` with the `BASE_URL` annotation. The operator labels the pods
    /// with `BASE_URL` itself.
    Tengu,
}

impl ManifestFlavour {
    /// The pod label that tells which base URL a consumer uses.
    pub fn base_url_label(&self) -> &'static str {
        match self {
            ManifestFlavour::K8sNative => "base-url",
            ManifestFlavour::Tengu => "BASE_URL",
        }
    }

    fn config_kind(&self) -> &'static str {
        match self {
            ManifestFlavour::K8sNative => "ConfigMap",
            ManifestFlavour::Tengu => "Service",
        }
    }
}

impl std::fmt::Display for ManifestFlavour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestFlavour::K8sNative => write!(f, "k8s-native"),
            ManifestFlavour::Tengu => write!(f, "tengu"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    annotations: BTreeMap<String, String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// The `ConfigMap` or `Service` that carries the base URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigDocument {
    kind: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spec: Option<ServiceSpec>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_name: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// The consumer `Deployment`, copied once per consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ConsumerDeployment {
    #[serde(default)]
    metadata: Metadata,
    spec: DeploymentSpec,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DeploymentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selector: Option<Selector>,
    template: PodTemplate,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Selector {
    #[serde(default)]
    match_labels: BTreeMap<String, String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PodTemplate {
    #[serde(default)]
    metadata: Metadata,
    spec: PodSpec,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PodSpec {
    containers: Vec<Container>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Container {
    name: String,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// A two document deployment template: the base URL carrier followed by one consumer deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestTemplate {
    flavour: ManifestFlavour,
    config: ConfigDocument,
    consumer: ConsumerDeployment,
}

impl ManifestTemplate {
    pub fn parse(yaml: &str, flavour: ManifestFlavour) -> Result<Self, ManifestError> {
        let mut config = None;
        let mut consumer = None;
        let mut found = 0;

        for document in serde_yaml::Deserializer::from_str(yaml) {
            match found {
                0 => config = Some(ConfigDocument::deserialize(document)?),
                1 => consumer = Some(ConsumerDeployment::deserialize(document)?),
                _ => {}
            }
            found += 1;
        }

        let (Some(config), Some(consumer), 2) = (config, consumer, found) else {
            return Err(ManifestError::DocumentCount { expected: 2, found });
        };

        if config.kind != flavour.config_kind() {
            return Err(ManifestError::ConfigKind {
                expected: flavour.config_kind(),
                found: config.kind,
            });
        }

        if consumer.spec.template.spec.containers.is_empty() {
            return Err(ManifestError::NoContainers(
                consumer.metadata.name.clone().unwrap_or_default(),
            ));
        }

        Ok(Self {
            flavour,
            config,
            consumer,
        })
    }

    pub fn flavour(&self) -> ManifestFlavour {
        self.flavour
    }

    /// Render the carrier configured with `base_url` followed by `count` consumer deployments
    /// named `<prefix>-<i>`.
    pub fn render(
        &self,
        count: usize,
        prefix: &str,
        base_url: &str,
    ) -> Result<String, ManifestError> {
        if self.flavour == ManifestFlavour::K8sNative && !is_label_value(base_url) {
            return Err(ManifestError::InvalidLabelValue(base_url.to_string()));
        }

        let mut documents = Vec::with_capacity(count + 1);
        documents.push(serde_yaml::to_string(&self.config_for(base_url))?);

        for i in 0..count {
            let name = format!("{prefix}-{i}");
            if !is_dns_label(&name) {
                return Err(ManifestError::InvalidName(name));
            }
            let consumer = self.consumer_for(&name, base_url);
            documents.push(serde_yaml::to_string(&consumer)?);
        }

        Ok(documents.join("---\n"))
    }

    fn config_for(&self, base_url: &str) -> ConfigDocument {
        let mut config = self.config.clone();
        match self.flavour {
            ManifestFlavour::K8sNative => {
                config
                    .data
                    .insert("BASE_URL".to_string(), base_url.to_string());
            }
            ManifestFlavour::Tengu => {
                config
                    .metadata
                    .annotations
                    .insert("BASE_URL".to_string(), base_url.to_string());
                config.spec.get_or_insert_with(Default::default).external_name =
                    Some(base_url.to_string());
            }
        }
        config
    }

    fn consumer_for(&self, name: &str, base_url: &str) -> ConsumerDeployment {
        let mut consumer = self.consumer.clone();
        consumer.metadata.name = Some(name.to_string());

        let template = &mut consumer.spec.template;
        template
            .metadata
            .labels
            .insert("app".to_string(), name.to_string());
        if let Some(container) = template.spec.containers.first_mut() {
            container.name = name.to_string();
        }

        if self.flavour == ManifestFlavour::K8sNative {
            template
                .metadata
                .labels
                .insert("base-url".to_string(), base_url.to_string());
            consumer
                .metadata
                .labels
                .insert("app".to_string(), name.to_string());
            consumer
                .spec
                .selector
                .get_or_insert_with(Default::default)
                .match_labels
                .insert("app".to_string(), name.to_string());
        }

        consumer
    }
}

/// Lowercase alphanumerics and `-`, at most 63 characters, starting and ending alphanumeric.
fn is_dns_label(value: &str) -> bool {
    value.len() <= 63
        && value.starts_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        && value.ends_with(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Kubernetes label value: at most 63 characters of alphanumerics, `-`, `_` and `.`, starting
/// and ending alphanumeric.
fn is_label_value(value: &str) -> bool {
    value.is_empty()
        || (value.len() <= 63
            && value.starts_with(|c: char| c.is_ascii_alphanumeric())
            && value.ends_with(|c: char| c.is_ascii_alphanumeric())
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const K8S_TEMPLATE: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: sse-config
data:
  BASE_URL: endpoint.example.com
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: sse-consumer
  labels:
    app: sse-consumer
spec:
  replicas: 1
  selector:
    matchLabels:
      app: sse-consumer
  template:
    metadata:
      labels:
        app: sse-consumer
        base-url: endpoint.example.com
    spec:
      containers:
        - name: sse-consumer
          image: tengu/sse-consumer:latest
          envFrom:
            - configMapRef:
                name: sse-config
"#;

    const TENGU_TEMPLATE: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: sse-endpoint
  annotations:
    BASE_URL: endpoint.example.com
spec:
  type: ExternalName
  externalName: endpoint.example.com
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: sse-consumer
spec:
  template:
    metadata:
      labels:
        app: sse-consumer
    spec:
      containers:
        - name: sse-consumer
          image: tengu/sse-consumer:latest
"#;

    fn documents(rendered: &str) -> Vec<Value> {
        serde_yaml::Deserializer::from_str(rendered)
            .map(|d| Value::deserialize(d).unwrap())
            .collect()
    }

    #[test]
    fn renders_one_deployment_per_consumer() {
        let template = ManifestTemplate::parse(K8S_TEMPLATE, ManifestFlavour::K8sNative).unwrap();

        let rendered = template
            .render(3, "sse-consumer", "2endpoint.example.com")
            .unwrap();
        let docs = documents(&rendered);

        assert_eq!(4, docs.len());
        assert_eq!(Some("2endpoint.example.com"), docs[0]["data"]["BASE_URL"].as_str());
        for (i, doc) in docs[1..].iter().enumerate() {
            let name = format!("sse-consumer-{i}");
            assert_eq!(Some(name.as_str()), doc["metadata"]["name"].as_str());
            assert_eq!(Some(name.as_str()), doc["metadata"]["labels"]["app"].as_str());
            assert_eq!(Some(name.as_str()), doc["spec"]["selector"]["matchLabels"]["app"].as_str());
            assert_eq!(Some(name.as_str()), doc["spec"]["template"]["metadata"]["labels"]["app"].as_str());
            assert_eq!(Some("2endpoint.example.com"), doc["spec"]["template"]["metadata"]["labels"]["base-url"].as_str());
            assert_eq!(Some(name.as_str()), doc["spec"]["template"]["spec"]["containers"][0]["name"].as_str());
            // Untyped fields survive.
            assert_eq!(Some(1), doc["spec"]["replicas"].as_u64());
            assert_eq!(Some("tengu/sse-consumer:latest"), doc["spec"]["template"]["spec"]["containers"][0]["image"].as_str());
            assert_eq!(Some("Deployment"), doc["kind"].as_str());
        }
    }

    #[test]
    fn tengu_moves_base_url_to_the_service() {
        let template = ManifestTemplate::parse(TENGU_TEMPLATE, ManifestFlavour::Tengu).unwrap();

        let rendered = template
            .render(2, "sse-consumer", "1endpoint.example.com")
            .unwrap();
        let docs = documents(&rendered);

        assert_eq!(3, docs.len());
        assert_eq!(Some("1endpoint.example.com"), docs[0]["metadata"]["annotations"]["BASE_URL"].as_str());
        assert_eq!(Some("1endpoint.example.com"), docs[0]["spec"]["externalName"].as_str());
        assert_eq!(Some("ExternalName"), docs[0]["spec"]["type"].as_str());

        assert_eq!(Some("sse-consumer-1"), docs[2]["metadata"]["name"].as_str());
        assert_eq!(Some("sse-consumer-1"), docs[2]["spec"]["template"]["metadata"]["labels"]["app"].as_str());
        assert!(docs[2]["spec"]["template"]["metadata"]["labels"]
            .get("base-url")
            .is_none());
        assert!(docs[2]["spec"].get("selector").is_none());
    }

    #[test]
    fn rejects_wrong_carrier_kind() {
        let err = ManifestTemplate::parse(K8S_TEMPLATE, ManifestFlavour::Tengu).unwrap_err();
        assert!(matches!(err, ManifestError::ConfigKind { .. }), "{err}");
    }

    #[test]
    fn rejects_single_document() {
        let single = K8S_TEMPLATE.split("---").next().unwrap();
        let err = ManifestTemplate::parse(single, ManifestFlavour::K8sNative).unwrap_err();
        assert!(
            matches!(err, ManifestError::DocumentCount { found: 1, .. }),
            "{err}"
        );
    }

    #[test]
    fn rejects_consumer_without_containers() {
        let yaml = K8S_TEMPLATE.replace(
            "      containers:\n        - name: sse-consumer\n          image: tengu/sse-consumer:latest\n          envFrom:\n            - configMapRef:\n                name: sse-config\n",
            "      containers: []\n",
        );
        let err = ManifestTemplate::parse(&yaml, ManifestFlavour::K8sNative).unwrap_err();
        assert!(matches!(err, ManifestError::NoContainers(_)), "{err}");
    }

    #[test]
    fn rejects_invalid_names_and_label_values() {
        let template = ManifestTemplate::parse(K8S_TEMPLATE, ManifestFlavour::K8sNative).unwrap();

        let err = template
            .render(1, "SSE_consumer", "endpoint.example.com")
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidName(_)), "{err}");

        let err = template
            .render(1, "sse-consumer", "http://endpoint.example.com/")
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidLabelValue(_)), "{err}");
    }

    #[test]
    fn label_value_rules() {
        assert!(is_label_value("endpoint.example.com"));
        assert!(is_label_value("10endpoint.example.com"));
        assert!(!is_label_value("-endpoint"));
        assert!(!is_label_value(&"a".repeat(64)));
        assert!(is_dns_label("sse-consumer-54"));
        assert!(!is_dns_label("sse-consumer-"));
    }
}
