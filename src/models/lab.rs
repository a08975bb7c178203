// Rok API payloads: the lab snapshot and the namespace's Rok token
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A volume as described by a Rok lab snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub extra_fields: BTreeMap<String, String>,
}

/// A previously captured Codeserver lab, fetched by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeserverLab {
    #[serde(default)]
    pub images: Vec<String>,
    pub image: String,
    pub cpu: String,
    pub memory: String,
    pub wsvolume: Option<Volume>,
    pub dtvolumes: Option<Vec<Volume>>,
    pub extra: Option<String>,
}

impl CodeserverLab {
    pub fn empty() -> Self {
        Self {
            wsvolume: Some(Volume::default()),
            dtvolumes: Some(Vec::new()),
            extra: Some("{}".to_string()),
            ..Default::default()
        }
    }

    pub fn data_volumes(&self) -> &[Volume] {
        self.dtvolumes.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RokToken {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lab_without_data_volumes() {
        let lab: CodeserverLab = serde_json::from_str(
            r#"{
                "images": ["a", "b"],
                "image": "b",
                "cpu": "0.5",
                "memory": "1Gi",
                "wsvolume": {"type": "New", "name": "ws", "extraFields": {"rokUrl": "u"}}
            }"#,
        )
        .unwrap();

        assert_eq!(lab.image, "b");
        assert!(lab.dtvolumes.is_none());
        assert!(lab.data_volumes().is_empty());
        let ws = lab.wsvolume.unwrap();
        assert_eq!(ws.kind, "New");
        assert_eq!(ws.extra_fields["rokUrl"], "u");
    }

    #[test]
    fn empty_lab_has_workspace_and_no_data_volumes() {
        let lab = CodeserverLab::empty();
        assert!(lab.wsvolume.is_some());
        assert_eq!(lab.data_volumes().len(), 0);
        assert_eq!(lab.extra.as_deref(), Some("{}"));
    }
}
