use anyhow::{Context, anyhow};
use gloo_net::http::{Request, Response};
use quickstart_wizard::{Reply, Result, Transport, WizardError};
use serde_json::Value;
use web_sys::{File, FormData};

/// Same-origin `fetch` through gloo-net.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

fn encode_component(input: &str) -> String {
    js_sys::encode_uri_component(input)
        .as_string()
        .unwrap_or_else(|| input.to_string())
}

fn urlencoded(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn multipart(file_field: &str, upload: &File, fields: &[(String, String)]) -> anyhow::Result<FormData> {
    let form = FormData::new().map_err(|err| anyhow!("{err:?}"))?;
    form.append_with_blob_and_filename(file_field, upload, &upload.name())
        .map_err(|err| anyhow!("{err:?}"))
        .with_context(|| format!("attaching {}", upload.name()))?;
    for (key, value) in fields {
        form.append_with_str(key, value)
            .map_err(|err| anyhow!("{err:?}"))
            .with_context(|| format!("appending {key}"))?;
    }
    Ok(form)
}

/// Non-JSON bodies (rendered pages, empty replies) decode to `null`.
async fn into_reply(path: &str, response: Response) -> Result<Reply> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| WizardError::network(path, err.to_string()))?;
    let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
    Ok(Reply { status, body })
}

async fn send(path: &str, request: std::result::Result<Request, gloo_net::Error>) -> Result<Reply> {
    let request = request.map_err(|err| WizardError::network(path, err.to_string()))?;
    let response = request
        .send()
        .await
        .map_err(|err| WizardError::network(path, err.to_string()))?;
    into_reply(path, response).await
}

impl Transport for FetchTransport {
    type Upload = File;

    async fn get(&self, path: &str) -> Result<Reply> {
        send(path, Request::get(path).build()).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Reply> {
        send(path, Request::post(path).json(body)).await
    }

    async fn post_form(&self, path: &str, fields: &[(String, String)]) -> Result<Reply> {
        let request = Request::post(path)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(urlencoded(fields));
        send(path, request).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        file_field: &str,
        upload: &File,
        fields: &[(String, String)],
    ) -> Result<Reply> {
        let form = multipart(file_field, upload, fields)
            .map_err(|err| WizardError::network(path, format!("{err:#}")))?;
        send(path, Request::post(path).body(form)).await
    }

    async fn delete(&self, path: &str) -> Result<Reply> {
        send(path, Request::delete(path).build()).await
    }
}
