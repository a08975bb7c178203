// Autofill the spawner form from a Rok Codeserver lab snapshot
use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION};

use crate::commands::notify::{Notifier, SnackType};
use crate::config::NotificationConfig;
use crate::error::{Error, Result};
use crate::models::form::{ensure_len, FormModel, VolumeFactory, VolumeType, ROK_URL};
use crate::models::lab::{CodeserverLab, Volume};

pub const EMPTY_URL_MESSAGE: &str = "The Rok Codeserver Lab URL can not be empty.";
pub const SUCCESS_MESSAGE: &str = "Successfully retrieved details from Rok Codeserver Lab URL";
pub const MALFORMED_MESSAGE: &str = "The Rok Codeserver Lab has an unexpected format";

/// Retrieves a lab snapshot by URL.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn get_codeserver_lab(&self, url: &str, token: &str) -> Result<CodeserverLab>;
}

/// Fetches labs from the Rok API over HTTP.
#[derive(Debug, Clone, Default)]
pub struct RokClient {
    http: reqwest::Client,
}

impl RokClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SnapshotFetcher for RokClient {
    async fn get_codeserver_lab(&self, url: &str, token: &str) -> Result<CodeserverLab> {
        log::info!("lab: fetching {url}");

        let lab = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<CodeserverLab>()
            .await?;

        log::debug!(
            "lab: image {} with {} data volume(s)",
            lab.image,
            lab.data_volumes().len()
        );
        Ok(lab)
    }
}

fn rok_url_of<'a>(vol: &'a Volume, what: &str) -> Result<&'a str> {
    vol.extra_fields
        .get(ROK_URL)
        .map(String::as_str)
        .ok_or_else(|| Error::malformed_lab(format!("{what} has no {ROK_URL}")))
}

/// Copies `lab` into `form`.
///
/// The data volume list grows to fit the lab but never shrinks; slots past
/// the lab's volumes keep their values. If the lab is missing a field the
/// form needs, nothing is changed.
pub fn set_lab_values(
    lab: &CodeserverLab,
    form: &mut FormModel,
    factory: &dyn VolumeFactory,
) -> Result<()> {
    let wsvolume = lab
        .wsvolume
        .as_ref()
        .ok_or_else(|| Error::malformed_lab("lab has no workspace volume"))?;
    let ws_url = rok_url_of(wsvolume, "workspace volume")?;
    let dt_urls = lab
        .data_volumes()
        .iter()
        .enumerate()
        .map(|(i, vol)| rok_url_of(vol, &format!("data volume {i}")))
        .collect::<Result<Vec<_>>>()?;

    form.custom_image = lab.image.clone();
    form.custom_image_check = true;
    form.cpu = lab.cpu.clone();
    form.memory = lab.memory.clone();

    form.workspace.set_rok_url(ws_url);
    form.workspace.kind = VolumeType::Existing;

    let added = ensure_len(&mut form.datavols, dt_urls.len(), |i| {
        factory.new_volume(&form.name, i)
    });
    if added > 0 {
        log::debug!("lab: added {added} data volume slot(s)");
    }

    for (vol, url) in form.datavols.iter_mut().zip(dt_urls) {
        vol.set_rok_url(url);
        vol.kind = VolumeType::Existing;
    }

    Ok(())
}

/// The form's "autofill" action: fetch the lab at `form.lab_url` and fill
/// the form from it, reporting the outcome through `notifier`.
pub async fn autofill_codeserver_lab(
    form: &mut FormModel,
    token: &str,
    fetcher: &dyn SnapshotFetcher,
    notifier: &dyn Notifier,
    factory: &dyn VolumeFactory,
    notifications: &NotificationConfig,
) -> Result<()> {
    if form.lab_url.is_empty() {
        notifier.notify(EMPTY_URL_MESSAGE, SnackType::Info, None);
        return Ok(());
    }

    let lab = match fetcher.get_codeserver_lab(&form.lab_url, token).await {
        Ok(lab) => lab,
        Err(e) => {
            log::warn!("lab: fetching {} failed: {e}", form.lab_url);
            notifier.notify(
                &format!("Couldn't retrieve the Rok Codeserver Lab: {e}"),
                SnackType::Error,
                None,
            );
            return Err(e);
        }
    };

    if let Err(e) = set_lab_values(&lab, form, factory) {
        log::warn!("lab: {e}");
        notifier.notify(MALFORMED_MESSAGE, SnackType::Error, None);
        return Err(e);
    }

    notifier.notify(
        SUCCESS_MESSAGE,
        SnackType::Success,
        Some(notifications.success_duration()),
    );
    Ok(())
}
