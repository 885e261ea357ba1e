use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// A Juju bundle. Only the applications and relations are typed, everything else is passed
/// through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JujuBundle {
    #[serde(default)]
    applications: BTreeMap<String, BundleApplication>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    relations: Vec<Vec<String>>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct BundleApplication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scale: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, Value>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl JujuBundle {
    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn application_names(&self) -> impl Iterator<Item = &str> {
        self.applications.keys().map(String::as_str)
    }

    /// Copy of this bundle with `count` consumer applications named `<prefix><i>`, each related
    /// to `endpoint`.
    pub fn with_consumers(&self, count: usize, prefix: &str, charm: &str, endpoint: &str) -> Self {
        let mut bundle = self.clone();
        for i in 0..count {
            let name = format!("{prefix}{i}");
            bundle.applications.insert(
                name.clone(),
                BundleApplication {
                    charm: Some(charm.to_string()),
                    scale: Some(1),
                    ..Default::default()
                },
            );
            bundle
                .relations
                .push(vec![endpoint.to_string(), format!("{name}:sse-endpoint")]);
        }
        bundle
    }

    /// Set a charm option on an application already in the bundle.
    pub fn set_option(
        &mut self,
        application: &str,
        key: &str,
        value: impl Into<String>,
    ) -> anyhow::Result<()> {
        let Some(app) = self.applications.get_mut(application) else {
            anyhow::bail!("Bundle has no application named {application}");
        };
        app.options
            .insert(key.to_string(), Value::String(value.into()));
        Ok(())
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
