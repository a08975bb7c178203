// Spawner form model: scalar fields, workspace volume and data volumes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Extra-fields key holding a volume's Rok snapshot URL.
pub const ROK_URL: &str = "rokUrl";

const DEFAULT_SIZE: &str = "10Gi";
const DEFAULT_MODE: &str = "ReadWriteOnce";
const HOME: &str = "/home/jovyan";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeType {
    #[default]
    New,
    Existing,
    None,
}

/// One volume sub-form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeGroup {
    #[serde(rename = "type")]
    pub kind: VolumeType,
    pub name: String,
    pub size: String,
    pub path: String,
    pub mode: String,
    #[serde(default)]
    pub extra_fields: BTreeMap<String, String>,
}

impl VolumeGroup {
    pub fn rok_url(&self) -> Option<&str> {
        self.extra_fields.get(ROK_URL).map(String::as_str)
    }

    pub fn set_rok_url(&mut self, url: impl Into<String>) {
        self.extra_fields.insert(ROK_URL.to_string(), url.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormModel {
    pub name: String,
    pub image: String,
    pub custom_image: String,
    pub custom_image_check: bool,
    pub cpu: String,
    pub memory: String,
    pub no_workspace: bool,
    pub workspace: VolumeGroup,
    pub datavols: Vec<VolumeGroup>,
    pub lab_url: String,
    #[serde(default)]
    pub configurations: Vec<String>,
    #[serde(default)]
    pub shm: bool,
}

impl FormModel {
    /// Initial form state for a Codeserver called `name`.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut workspace = VolumeGroup {
            kind: VolumeType::New,
            name: format!("{name}-workspace"),
            size: DEFAULT_SIZE.to_string(),
            path: HOME.to_string(),
            mode: DEFAULT_MODE.to_string(),
            extra_fields: BTreeMap::new(),
        };
        workspace.set_rok_url("");

        Self {
            name,
            workspace,
            shm: true,
            ..Default::default()
        }
    }

    /// Body for the backend's `POST /api/namespaces/<ns>/vscodes`.
    pub fn to_request_body(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Builds the default volume group appended when the form needs another
/// data volume slot.
pub trait VolumeFactory {
    /// `index` is the position the new group will take in the list.
    fn new_volume(&self, form_name: &str, index: usize) -> VolumeGroup;
}

/// The Rok UI's data volume: a new PVC with an empty `rokUrl` extra field.
#[derive(Debug, Clone, Copy, Default)]
pub struct RokDataVolumeFactory;

impl VolumeFactory for RokDataVolumeFactory {
    fn new_volume(&self, form_name: &str, index: usize) -> VolumeGroup {
        let k = index + 1;
        let mut vol = VolumeGroup {
            kind: VolumeType::New,
            name: format!("{form_name}-vol-{k}"),
            size: DEFAULT_SIZE.to_string(),
            path: format!("{HOME}/data-vol-{k}"),
            mode: DEFAULT_MODE.to_string(),
            extra_fields: BTreeMap::new(),
        };
        vol.set_rok_url("");
        vol
    }
}

/// Grows `list` to at least `n` elements, building each new one with
/// `factory(index)`. Never truncates. Returns how many were appended.
pub fn ensure_len<T>(list: &mut Vec<T>, n: usize, mut factory: impl FnMut(usize) -> T) -> usize {
    let missing = n.saturating_sub(list.len());
    for _ in 0..missing {
        let index = list.len();
        list.push(factory(index));
    }
    missing
}

/// Appends one default data volume group to the form.
pub fn add_rok_data_volume(form: &mut FormModel, factory: &dyn VolumeFactory) {
    let vol = factory.new_volume(&form.name, form.datavols.len());
    form.datavols.push(vol);
}
