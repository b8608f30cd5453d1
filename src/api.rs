//! Backend endpoints the wizard calls, behind the [`Transport`] trait.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{Result, WizardError};

pub const LIST_UPLOADED_IMAGES: &str = "/list_uploaded_images";
pub const UPLOAD_LIBRARY_IMAGE: &str = "/upload_library_image";
pub const FETCH_LIBRARY_IMAGE: &str = "/fetch_library_image";
pub const RENAME_LIBRARY_IMAGE: &str = "/rename_library_image";
pub const DELETE_LIBRARY_IMAGE: &str = "/delete_library_image";
pub const GENERATE_PREVIEW: &str = "/generate_preview";
pub const CHECK_BASE_IMAGES: &str = "/check_base_images";
pub const UPLOAD_BASE_IMAGE: &str = "/upload_base_image";
pub const DELETE_BASE_IMAGE: &str = "/delete_base_image";
pub const TOP_IMDB_ITEMS: &str = "/get_top_imdb_items";
pub const CLEAR_SESSION: &str = "/clear_session";
pub const CLEAR_DATA: &str = "/clear_data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
        }
    }

    /// Prefix used by every form field id of a library of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Movie => "mov",
            Self::Show => "sho",
        }
    }

    pub fn upload_dir(self) -> &'static str {
        match self {
            Self::Movie => "movies",
            Self::Show => "shows",
        }
    }

    pub fn from_library_id(library_id: &str) -> Option<Self> {
        let id = library_id.trim();
        if id.starts_with("mov") {
            Some(Self::Movie)
        } else if id.starts_with("sho") {
            Some(Self::Show)
        } else {
            None
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" | "mov" => Some(Self::Movie),
            "show" | "shows" | "sho" => Some(Self::Show),
            _ => None,
        }
    }
}

/// Raw backend answer. Bodies that are not JSON arrive as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Same-origin HTTP as the wizard pages need it. The browser build
/// implements this over `fetch`; tests use an in-memory recorder.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// A file the user picked for upload.
    type Upload;

    async fn get(&self, path: &str) -> Result<Reply>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Reply>;

    async fn post_form(&self, path: &str, fields: &[(String, String)]) -> Result<Reply>;

    async fn post_multipart(
        &self,
        path: &str,
        file_field: &str,
        upload: &Self::Upload,
        fields: &[(String, String)],
    ) -> Result<Reply>;

    async fn delete(&self, path: &str) -> Result<Reply>;
}

/// Decodes a reply body. Error statuses whose body still matches `T` are
/// returned as values so their `error`/`message` text can be shown.
pub fn decode_reply<T>(path: &str, reply: Reply) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = reply.status;
    let success = reply.is_success();
    match serde_json::from_value::<T>(reply.body) {
        Ok(value) => Ok(value),
        Err(source) if success => Err(WizardError::Decode {
            path: path.to_string(),
            source,
        }),
        Err(_) => Err(WizardError::Status {
            path: path.to_string(),
            status,
        }),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateReply {
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    pub validated: Option<bool>,
    #[serde(default)]
    pub success: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValidateReply {
    pub fn is_valid(&self) -> bool {
        self.valid.or(self.validated).unwrap_or(false)
            || self
                .success
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty())
    }

    /// The backend's own explanation, preferring `error` over `message`.
    pub fn detail(&self) -> Option<&str> {
        [self.error.as_deref(), self.message.as_deref(), self.success.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }

    pub fn extra_str(&self, key: &str) -> Option<String> {
        match self.extra.get(key)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn extra_list(&self, key: &str) -> Vec<Value> {
        self.extra
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusReply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl StatusReply {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageListReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseImagesReply {
    #[serde(default)]
    pub movie: Option<String>,
    #[serde(default)]
    pub show: Option<String>,
}

impl BaseImagesReply {
    pub fn for_kind(&self, kind: MediaKind) -> Option<&str> {
        match kind {
            MediaKind::Movie => self.movie.as_deref(),
            MediaKind::Show => self.show.as_deref(),
        }
        .filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewRequest {
    pub library_id: String,
    pub overlays: Vec<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub selected_image: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImdbItem {
    #[serde(alias = "imdb_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<Value>,
}

impl ImdbItem {
    pub fn label(&self) -> String {
        let year = match &self.year {
            Some(Value::Number(number)) => number.to_string(),
            Some(Value::String(text)) => text.trim().to_string(),
            _ => String::new(),
        };
        match (self.title.trim(), year.is_empty()) {
            ("", _) => self.id.clone(),
            (title, true) => title.to_string(),
            (title, false) => format!("{title} ({year})"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TopImdbBody {
    Items(Vec<ImdbItem>),
    Wrapped {
        #[serde(default, alias = "top_imdb_items")]
        items: Vec<ImdbItem>,
    },
}

pub async fn validate<T: Transport>(
    transport: &T,
    endpoint: &str,
    payload: &Value,
) -> Result<ValidateReply> {
    debug!("posting validation to {endpoint}");
    let reply = transport.post_json(endpoint, payload).await?;
    decode_reply(endpoint, reply)
}

pub async fn list_uploaded_images<T: Transport>(
    transport: &T,
    kind: MediaKind,
) -> Result<ImageListReply> {
    let path = format!("{LIST_UPLOADED_IMAGES}?type={}", kind.as_str());
    let reply = transport.get(&path).await?;
    decode_reply(&path, reply)
}

pub async fn upload_library_image<T: Transport>(
    transport: &T,
    upload: &T::Upload,
    kind: MediaKind,
) -> Result<StatusReply> {
    let fields = vec![("type".to_string(), kind.as_str().to_string())];
    let reply = transport
        .post_multipart(UPLOAD_LIBRARY_IMAGE, "image", upload, &fields)
        .await?;
    decode_reply(UPLOAD_LIBRARY_IMAGE, reply)
}

pub async fn fetch_library_image<T: Transport>(
    transport: &T,
    url: &str,
    kind: MediaKind,
) -> Result<StatusReply> {
    let body = json!({ "url": url, "type": kind.as_str() });
    let reply = transport.post_json(FETCH_LIBRARY_IMAGE, &body).await?;
    decode_reply(FETCH_LIBRARY_IMAGE, reply)
}

pub async fn rename_library_image<T: Transport>(
    transport: &T,
    old_name: &str,
    new_name: &str,
    kind: MediaKind,
) -> Result<StatusReply> {
    let body = json!({
        "old_name": old_name,
        "new_name": new_name,
        "type": kind.as_str(),
    });
    let reply = transport.post_json(RENAME_LIBRARY_IMAGE, &body).await?;
    decode_reply(RENAME_LIBRARY_IMAGE, reply)
}

pub async fn delete_library_image<T: Transport>(
    transport: &T,
    name: &str,
    kind: MediaKind,
) -> Result<StatusReply> {
    let path = format!(
        "{DELETE_LIBRARY_IMAGE}/{}?type={}",
        urlencoding::encode(name),
        kind.as_str()
    );
    let reply = transport.delete(&path).await?;
    decode_reply(&path, reply)
}

pub async fn generate_preview<T: Transport>(
    transport: &T,
    request: &PreviewRequest,
) -> Result<StatusReply> {
    let body = serde_json::to_value(request).map_err(|source| WizardError::Decode {
        path: GENERATE_PREVIEW.to_string(),
        source,
    })?;
    let reply = transport.post_json(GENERATE_PREVIEW, &body).await?;
    decode_reply(GENERATE_PREVIEW, reply)
}

pub async fn check_base_images<T: Transport>(transport: &T) -> Result<BaseImagesReply> {
    let reply = transport.get(CHECK_BASE_IMAGES).await?;
    decode_reply(CHECK_BASE_IMAGES, reply)
}

pub async fn upload_base_image<T: Transport>(
    transport: &T,
    upload: &T::Upload,
    kind: MediaKind,
) -> Result<StatusReply> {
    let fields = vec![("type".to_string(), kind.as_str().to_string())];
    let reply = transport
        .post_multipart(UPLOAD_BASE_IMAGE, "image", upload, &fields)
        .await?;
    decode_reply(UPLOAD_BASE_IMAGE, reply)
}

pub async fn delete_base_image<T: Transport>(
    transport: &T,
    kind: MediaKind,
) -> Result<StatusReply> {
    let body = json!({ "type": kind.as_str() });
    let reply = transport.post_json(DELETE_BASE_IMAGE, &body).await?;
    decode_reply(DELETE_BASE_IMAGE, reply)
}

pub async fn top_imdb_items<T: Transport>(
    transport: &T,
    library: &str,
    kind: MediaKind,
    placeholder_id: &str,
) -> Result<Vec<ImdbItem>> {
    let path = format!(
        "{TOP_IMDB_ITEMS}/{}?type={}&placeholder_id={}",
        urlencoding::encode(library),
        kind.as_str(),
        urlencoding::encode(placeholder_id)
    );
    let reply = transport.get(&path).await?;
    let body = decode_reply::<TopImdbBody>(&path, reply)?;
    Ok(match body {
        TopImdbBody::Items(items) | TopImdbBody::Wrapped { items } => items,
    })
}

pub async fn clear_session<T: Transport>(transport: &T, config_name: &str) -> Result<StatusReply> {
    let fields = vec![("name".to_string(), config_name.to_string())];
    let reply = transport.post_form(CLEAR_SESSION, &fields).await?;
    decode_reply(CLEAR_SESSION, reply)
}

pub fn clear_data_path(config_name: &str) -> String {
    format!("{CLEAR_DATA}/{}", urlencoding::encode(config_name.trim()))
}

/// Posts the page form; only the status matters because the backend
/// answers with a rendered page.
pub async fn submit_form<T: Transport>(
    transport: &T,
    action: &str,
    fields: &[(String, String)],
) -> Result<()> {
    let reply = transport.post_form(action, fields).await?;
    if reply.is_success() {
        Ok(())
    } else {
        Err(WizardError::Status {
            path: action.to_string(),
            status: reply.status,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::Value;

    use super::{Reply, Transport};
    use crate::error::{Result, WizardError};

    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub method: &'static str,
        pub path: String,
        pub body: Value,
    }

    /// Answers requests from a queue and records everything it was asked.
    #[derive(Debug, Default)]
    pub struct RecordingTransport {
        replies: RefCell<VecDeque<Result<Reply>>>,
        calls: RefCell<Vec<Call>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, body: Value) -> Self {
            self.replies.borrow_mut().push_back(Ok(Reply::ok(body)));
            self
        }

        pub fn reply_status(self, status: u16, body: Value) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Ok(Reply { status, body }));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Err(WizardError::network("test", message)));
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn answer(&self, method: &'static str, path: &str, body: Value) -> Result<Reply> {
            self.calls.borrow_mut().push(Call {
                method,
                path: path.to_string(),
                body,
            });
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Reply::ok(Value::Null)))
        }
    }

    fn pairs_to_value(fields: &[(String, String)]) -> Value {
        Value::Array(
            fields
                .iter()
                .map(|(key, value)| Value::Array(vec![key.clone().into(), value.clone().into()]))
                .collect(),
        )
    }

    impl Transport for RecordingTransport {
        type Upload = String;

        async fn get(&self, path: &str) -> Result<Reply> {
            self.answer("GET", path, Value::Null)
        }

        async fn post_json(&self, path: &str, body: &Value) -> Result<Reply> {
            self.answer("POST", path, body.clone())
        }

        async fn post_form(&self, path: &str, fields: &[(String, String)]) -> Result<Reply> {
            self.answer("POST", path, pairs_to_value(fields))
        }

        async fn post_multipart(
            &self,
            path: &str,
            file_field: &str,
            upload: &Self::Upload,
            fields: &[(String, String)],
        ) -> Result<Reply> {
            let mut all = vec![(file_field.to_string(), upload.clone())];
            all.extend(fields.iter().cloned());
            self.answer("POST", path, pairs_to_value(&all))
        }

        async fn delete(&self, path: &str) -> Result<Reply> {
            self.answer("DELETE", path, Value::Null)
        }
    }
}
