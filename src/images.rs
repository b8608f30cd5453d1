//! Preview background images for each library card, the overlay list sent
//! with preview requests, and the shared base images.

use tracing::{debug, info, warn};

use crate::api::{self, ImageListReply, MediaKind, PreviewRequest, StatusReply, Transport};
use crate::config::WizardConfig;
use crate::credentials::SelectOption;
use crate::error::{Result, WizardError};
use crate::flags::StatusMessage;
use crate::storage::{ClientStorage, selected_image_key};

const CONTENT_RATING_PREFIX: &str = "content_rating";

/// Element ids of one library's image controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageIds {
    pub dropdown: String,
    pub delete_button: String,
    pub rename_button: String,
    pub upload_input: String,
    pub url_input: String,
    pub fetch_button: String,
    pub preview_image: String,
    pub overlays_container: String,
    pub content_rating_container: String,
}

impl ImageIds {
    pub fn for_library(library_id: &str) -> Self {
        Self {
            dropdown: format!("{library_id}-image-dropdown"),
            delete_button: format!("{library_id}-delete-image-btn"),
            rename_button: format!("{library_id}-rename-image-btn"),
            upload_input: format!("{library_id}-upload-image"),
            url_input: format!("{library_id}-image-url"),
            fetch_button: format!("{library_id}-fetch-url-btn"),
            preview_image: format!("{library_id}-overlayPreviewImage"),
            overlays_container: format!("{library_id}-overlays"),
            content_rating_container: format!("{library_id}-contentRatingOverlays"),
        }
    }
}

/// Dropdown contents after a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageChoices {
    pub options: Vec<SelectOption>,
    pub selected: String,
}

impl ImageChoices {
    /// Delete and rename only make sense for an uploaded image.
    pub fn controls_visible(&self, config: &WizardConfig) -> bool {
        controls_visible(config, self.options.len(), &self.selected)
    }
}

pub fn controls_visible(config: &WizardConfig, option_count: usize, selected: &str) -> bool {
    option_count > 1 && !config.is_sentinel_image(selected)
}

/// Sentinel first, then the uploads; the remembered choice wins when it is
/// still on offer.
pub fn image_choices(config: &WizardConfig, images: &[String], remembered: Option<&str>) -> ImageChoices {
    let mut options = vec![SelectOption::new(
        config.sentinel_image.as_str(),
        config.sentinel_label.as_str(),
    )];
    options.extend(
        images
            .iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| SelectOption::new(name.as_str(), name.as_str())),
    );
    let selected = remembered
        .filter(|wanted| options.iter().any(|o| o.value == *wanted))
        .unwrap_or(config.sentinel_image.as_str())
        .to_string();
    ImageChoices { options, selected }
}

/// Keeps the old extension when the new name leaves it off.
pub fn renamed_with_extension(old_name: &str, new_name: &str) -> String {
    let new_name = new_name.trim();
    let Some((_, ext)) = old_name.rsplit_once('.') else {
        return new_name.to_string();
    };
    let suffix = format!(".{}", ext.to_lowercase());
    if new_name.to_lowercase().ends_with(&suffix) {
        new_name.to_string()
    } else {
        format!("{new_name}.{ext}")
    }
}

/// Overlay ids for a preview: checked overlay toggles plus the chosen
/// content rating, re-prefixed from the library id to `mov-`/`sho-`.
pub fn collect_overlays(
    library_id: &str,
    kind: MediaKind,
    checked: &[String],
    content_rating: Option<&str>,
) -> Vec<String> {
    let mut overlays: Vec<String> = checked.to_vec();
    match content_rating.map(str::trim).filter(|v| !v.is_empty()) {
        Some(rating) => overlays.push(rating.to_string()),
        None => overlays.retain(|overlay| !overlay.starts_with(CONTENT_RATING_PREFIX)),
    }
    let library_prefix = format!("{library_id}-");
    let kind_prefix = format!("{}-", kind.prefix());
    overlays
        .into_iter()
        .map(|overlay| match overlay.strip_prefix(&library_prefix) {
            Some(rest) => format!("{kind_prefix}{rest}"),
            None => overlay,
        })
        .collect()
}

/// Radio group that can be cleared by clicking the selected option again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentRatingGroup {
    selected: Option<String>,
}

impl ContentRatingGroup {
    pub fn new(selected: Option<&str>) -> Self {
        Self {
            selected: selected
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        }
    }

    /// Returns the new selection.
    pub fn click(&mut self, value: &str) -> Option<&str> {
        if self.selected.as_deref() == Some(value) {
            self.selected = None;
        } else {
            self.selected = Some(value.to_string());
        }
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn hidden_value(&self) -> &str {
        self.selected.as_deref().unwrap_or("")
    }
}

pub fn content_rating_hidden_name(library_id: &str) -> String {
    format!("{library_id}-overlay_selected_content_rating")
}

/// Extracts the library id from a content-rating radio id such as
/// `mov-library_movies-overlay_content_rating_us`.
pub fn library_id_from_rating_radio(radio_id: &str) -> Option<&str> {
    if !(radio_id.starts_with("mov-library_") || radio_id.starts_with("sho-library_")) {
        return None;
    }
    radio_id
        .find("-overlay_content_rating_")
        .map(|end| &radio_id[..end])
}

fn status_result(reply: StatusReply, fallback: &str) -> Result<StatusReply> {
    if reply.is_success() {
        Ok(reply)
    } else {
        Err(WizardError::rejected(
            reply.message.unwrap_or_else(|| fallback.to_string()),
        ))
    }
}

/// Image operations for one library card.
pub struct ImageManager<'a, S: ClientStorage> {
    config: &'a WizardConfig,
    storage: &'a S,
    library_id: String,
    kind: MediaKind,
}

impl<'a, S: ClientStorage> ImageManager<'a, S> {
    pub fn new(config: &'a WizardConfig, storage: &'a S, library_id: &str, kind: MediaKind) -> Self {
        Self {
            config,
            storage,
            library_id: library_id.to_string(),
            kind,
        }
    }

    pub fn library_id(&self) -> &str {
        &self.library_id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn ids(&self) -> ImageIds {
        ImageIds::for_library(&self.library_id)
    }

    pub fn remembered(&self) -> Option<String> {
        self.storage.get(&selected_image_key(&self.library_id))
    }

    pub fn remember(&self, name: &str) {
        self.storage.set(&selected_image_key(&self.library_id), name.trim());
    }

    pub async fn list<T: Transport>(&self, transport: &T) -> Result<ImageChoices> {
        let reply: ImageListReply = api::list_uploaded_images(transport, self.kind).await?;
        if reply.status.as_deref() == Some("error") {
            return Err(WizardError::rejected(
                reply
                    .message
                    .unwrap_or_else(|| "Failed to load available images.".to_string()),
            ));
        }
        let remembered = self.remembered();
        let choices = image_choices(self.config, &reply.images, remembered.as_deref());
        debug!(
            "{} images for {} ({} selected)",
            reply.images.len(),
            self.library_id,
            choices.selected
        );
        Ok(choices)
    }

    pub async fn upload<T: Transport>(
        &self,
        transport: &T,
        file: &T::Upload,
    ) -> Result<(StatusMessage, ImageChoices)> {
        let reply = api::upload_library_image(transport, file, self.kind).await?;
        self.after_store(transport, status_result(reply, "Failed to upload image.")?)
            .await
    }

    pub async fn fetch_url<T: Transport>(
        &self,
        transport: &T,
        url: &str,
    ) -> Result<(StatusMessage, ImageChoices)> {
        let url = url.trim();
        if url.is_empty() {
            return Err(WizardError::MissingFields(vec![self.ids().url_input]));
        }
        let reply = api::fetch_library_image(transport, url, self.kind).await?;
        self.after_store(transport, status_result(reply, "Failed to fetch image.")?)
            .await
    }

    async fn after_store<T: Transport>(
        &self,
        transport: &T,
        reply: StatusReply,
    ) -> Result<(StatusMessage, ImageChoices)> {
        if let Some(filename) = reply.filename.as_deref() {
            self.remember(filename);
        }
        let message = StatusMessage::success(
            reply
                .message
                .unwrap_or_else(|| "Image saved successfully.".to_string()),
        );
        let choices = self.list(transport).await?;
        Ok((message, choices))
    }

    pub async fn rename<T: Transport>(
        &self,
        transport: &T,
        old_name: &str,
        new_name: &str,
    ) -> Result<(StatusMessage, ImageChoices)> {
        if self.config.is_sentinel_image(old_name) {
            return Err(WizardError::SentinelImage(self.config.sentinel_image.clone()));
        }
        if new_name.trim().is_empty() {
            return Err(WizardError::MissingFields(vec!["new_name".to_string()]));
        }
        let target = renamed_with_extension(old_name, new_name);
        let reply = api::rename_library_image(transport, old_name.trim(), &target, self.kind).await?;
        status_result(reply, "Failed to rename image.")?;
        info!("renamed {old_name} to {target}");
        self.remember(&target);
        let choices = self.list(transport).await?;
        Ok((StatusMessage::success("Image renamed successfully."), choices))
    }

    pub async fn delete<T: Transport>(
        &self,
        transport: &T,
        name: &str,
    ) -> Result<(StatusMessage, ImageChoices)> {
        if self.config.is_sentinel_image(name) {
            return Err(WizardError::SentinelImage(self.config.sentinel_image.clone()));
        }
        let reply = api::delete_library_image(transport, name.trim(), self.kind).await?;
        let reply = status_result(reply, "Failed to delete image.")?;
        let message = StatusMessage::success(
            reply
                .message
                .unwrap_or_else(|| "Image deleted successfully.".to_string()),
        );
        let choices = self.list(transport).await?;
        Ok((message, choices))
    }

    /// Asks for a fresh render and returns the cache-busted image URL.
    pub async fn generate_preview<T: Transport>(
        &self,
        transport: &T,
        overlays: Vec<String>,
        selected_image: &str,
        stamp: u64,
    ) -> Result<String> {
        let request = PreviewRequest {
            library_id: self.library_id.clone(),
            overlays,
            kind: self.kind.as_str(),
            selected_image: selected_image.trim().to_string(),
        };
        let reply = api::generate_preview(transport, &request).await?;
        status_result(reply, "Failed to generate preview.")?;
        Ok(self
            .config
            .preview_image_url(&self.library_id, self.kind, stamp))
    }
}

/// Turns an image operation failure into the toast to show.
pub fn failure_toast(err: &WizardError) -> StatusMessage {
    match err {
        WizardError::SentinelImage(_) => {
            StatusMessage::warning("Please select a custom image first.")
        }
        WizardError::MissingFields(_) => StatusMessage::warning("Please fill in the required value."),
        WizardError::Rejected(message) => StatusMessage::error(message.clone()),
        other => {
            warn!("image request failed: {other}");
            StatusMessage::error("Image request failed. Please check your network or try again.")
        }
    }
}

/// Base images shared across libraries of one media type.
pub struct BaseImages<'a> {
    config: &'a WizardConfig,
}

impl<'a> BaseImages<'a> {
    pub fn new(config: &'a WizardConfig) -> Self {
        Self { config }
    }

    /// Current base image URL per kind, if one was uploaded.
    pub async fn status<T: Transport>(
        &self,
        transport: &T,
    ) -> Result<Vec<(MediaKind, Option<String>)>> {
        let reply = api::check_base_images(transport).await?;
        Ok([MediaKind::Movie, MediaKind::Show]
            .into_iter()
            .map(|kind| {
                let url = reply
                    .for_kind(kind)
                    .map(|name| self.config.uploaded_image_url(kind, name));
                (kind, url)
            })
            .collect())
    }

    pub async fn upload<T: Transport>(
        &self,
        transport: &T,
        file: &T::Upload,
        kind: MediaKind,
    ) -> Result<StatusMessage> {
        let reply = api::upload_base_image(transport, file, kind).await?;
        let reply = status_result(reply, "Failed to upload base image.")?;
        Ok(StatusMessage::success(
            reply
                .message
                .unwrap_or_else(|| "Base image uploaded.".to_string()),
        ))
    }

    pub async fn delete<T: Transport>(&self, transport: &T, kind: MediaKind) -> Result<StatusMessage> {
        let reply = api::delete_base_image(transport, kind).await?;
        let reply = status_result(reply, "Failed to delete base image.")?;
        Ok(StatusMessage::success(
            reply
                .message
                .unwrap_or_else(|| "Base image deleted.".to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::testing::RecordingTransport;
    use crate::storage::MemoryStorage;

    #[test]
    fn choices_restore_remembered_image() {
        let config = WizardConfig::default();
        let images = vec!["a.png".to_string(), "b.jpg".to_string()];
        let choices = image_choices(&config, &images, Some("b.jpg"));
        assert_eq!(choices.options[0].label, "Default Kometa");
        assert_eq!(choices.selected, "b.jpg");
        assert!(choices.controls_visible(&config));
        let choices = image_choices(&config, &images, Some("gone.png"));
        assert_eq!(choices.selected, "default");
        assert!(!choices.controls_visible(&config));
        assert!(!controls_visible(&config, 1, "default"));
    }

    #[test]
    fn rename_keeps_extension() {
        assert_eq!(renamed_with_extension("old.png", "poster"), "poster.png");
        assert_eq!(renamed_with_extension("old.png", "poster.PNG"), "poster.PNG");
        assert_eq!(renamed_with_extension("noext", "poster"), "poster");
    }

    #[test]
    fn overlays_are_reprefixed() {
        let checked = vec![
            "mov-library_movies-overlay_resolution".to_string(),
            "content_rating_us".to_string(),
        ];
        let overlays = collect_overlays("mov-library_movies", MediaKind::Movie, &checked, None);
        assert_eq!(overlays, vec!["mov-overlay_resolution"]);
        let overlays = collect_overlays(
            "sho-library_tv",
            MediaKind::Show,
            &["sho-library_tv-overlay_ribbon".to_string()],
            Some("sho-library_tv-content_rating_uk"),
        );
        assert_eq!(overlays, vec!["sho-overlay_ribbon", "sho-content_rating_uk"]);
    }

    #[test]
    fn content_rating_can_be_unselected() {
        let mut group = ContentRatingGroup::new(None);
        assert_eq!(group.click("us"), Some("us"));
        assert_eq!(group.click("uk"), Some("uk"));
        assert_eq!(group.click("uk"), None);
        assert_eq!(group.hidden_value(), "");
        assert_eq!(
            library_id_from_rating_radio("mov-library_my-movies-overlay_content_rating_us"),
            Some("mov-library_my-movies")
        );
        assert_eq!(library_id_from_rating_radio("overlay_content_rating_us"), None);
        assert_eq!(
            content_rating_hidden_name("mov-library_movies"),
            "mov-library_movies-overlay_selected_content_rating"
        );
    }

    #[tokio::test]
    async fn sentinel_is_refused_without_network() {
        let config = WizardConfig::default();
        let storage = MemoryStorage::new();
        let transport = RecordingTransport::new();
        let manager = ImageManager::new(&config, &storage, "mov-library_movies", MediaKind::Movie);
        let err = manager.delete(&transport, "default").await.unwrap_err();
        assert!(matches!(err, WizardError::SentinelImage(_)));
        let err = manager.rename(&transport, "default", "x").await.unwrap_err();
        assert!(matches!(err, WizardError::SentinelImage(_)));
        assert!(transport.calls().is_empty());
        assert_eq!(failure_toast(&err).text, "Please select a custom image first.");
    }

    #[tokio::test]
    async fn rename_reselects_new_name() {
        let config = WizardConfig::default();
        let storage = MemoryStorage::new();
        let transport = RecordingTransport::new()
            .reply(json!({"status": "success"}))
            .reply(json!({"images": ["poster.png"]}));
        let manager = ImageManager::new(&config, &storage, "mov-library_movies", MediaKind::Movie);
        let (message, choices) = manager.rename(&transport, "old.png", "poster").await.unwrap();
        assert_eq!(message.text, "Image renamed successfully.");
        assert_eq!(choices.selected, "poster.png");
        assert_eq!(manager.remembered().as_deref(), Some("poster.png"));
        let calls = transport.calls();
        assert_eq!(
            calls[0].body,
            json!({"old_name": "old.png", "new_name": "poster.png", "type": "movie"})
        );
        assert_eq!(calls[1].path, "/list_uploaded_images?type=movie");
    }

    #[tokio::test]
    async fn upload_selects_stored_file() {
        let config = WizardConfig::default();
        let storage = MemoryStorage::new();
        let transport = RecordingTransport::new()
            .reply(json!({"status": "success", "message": "Uploaded", "filename": "bg.png"}))
            .reply(json!({"images": ["bg.png", "other.png"]}));
        let manager = ImageManager::new(&config, &storage, "sho-library_tv", MediaKind::Show);
        let (message, choices) = manager
            .upload(&transport, &"bg.png".to_string())
            .await
            .unwrap();
        assert_eq!(message.text, "Uploaded");
        assert_eq!(choices.selected, "bg.png");
        assert_eq!(
            transport.calls()[0].body,
            json!([["image", "bg.png"], ["type", "show"]])
        );
    }

    #[tokio::test]
    async fn failed_listing_is_rejected() {
        let config = WizardConfig::default();
        let storage = MemoryStorage::new();
        let transport =
            RecordingTransport::new().reply(json!({"status": "error", "message": "No uploads dir"}));
        let manager = ImageManager::new(&config, &storage, "mov-library_movies", MediaKind::Movie);
        let err = manager.list(&transport).await.unwrap_err();
        assert_eq!(failure_toast(&err).text, "No uploads dir");
    }

    #[tokio::test]
    async fn preview_url_is_cache_busted() {
        let config = WizardConfig::default();
        let storage = MemoryStorage::new();
        let transport = RecordingTransport::new().reply(json!({"status": "success"}));
        let manager = ImageManager::new(&config, &storage, "mov-library_movies", MediaKind::Movie);
        let url = manager
            .generate_preview(&transport, vec!["mov-overlay_resolution".to_string()], "default", 7)
            .await
            .unwrap();
        assert_eq!(url, "/config/previews/mov-library_movies-movie_preview.png?t=7");
        assert_eq!(
            transport.calls()[0].body,
            json!({
                "library_id": "mov-library_movies",
                "overlays": ["mov-overlay_resolution"],
                "type": "movie",
                "selected_image": "default",
            })
        );
    }

    #[tokio::test]
    async fn base_image_status_builds_urls() {
        let config = WizardConfig::default();
        let transport = RecordingTransport::new().reply(json!({"movie": "base.png", "show": null}));
        let status = BaseImages::new(&config).status(&transport).await.unwrap();
        assert_eq!(
            status,
            vec![
                (MediaKind::Movie, Some("/config/uploads/movies/base.png".to_string())),
                (MediaKind::Show, None),
            ]
        );
    }
}
