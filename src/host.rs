//! Platform services the viewer needs from its host page.
//!
//! Everything that touches the network or decodes media goes through [`HostServices`], which is
//! passed explicitly to the loaders. [`BrowserHost`] is the `window.fetch` implementation; tests
//! substitute their own.
use async_trait::async_trait;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("browser window not available")]
    NoWindow,
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("unreadable response body from {url}: {reason}")]
    Body { url: String, reason: String },
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded RGBA8 pixels, row-major from the top row.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
impl DecodedImage {
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: rgba.repeat(width as usize * height as usize),
        }
    }
}

/// Decodes PNG or JPEG bytes (format sniffed from the content) to RGBA8.
pub fn decode_rgba(bytes: &[u8]) -> Result<DecodedImage, HostError> {
    let rgba = image::load_from_memory(bytes)?.into_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[async_trait(?Send)]
pub trait HostServices {
    async fn fetch_text(&self, url: &str) -> Result<String, HostError>;

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, HostError>;

    async fn decode_image(&self, bytes: &[u8]) -> Result<DecodedImage, HostError> {
        decode_rgba(bytes)
    }

    /// POSTs `body` as `application/json`. Only the status is inspected.
    async fn post_json(&self, url: &str, body: &str) -> Result<(), HostError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHost;

fn request_error(url: &str, e: JsValue) -> HostError {
    HostError::Request {
        url: url.to_string(),
        reason: format!("{e:?}"),
    }
}

fn body_error(url: &str, e: JsValue) -> HostError {
    HostError::Body {
        url: url.to_string(),
        reason: format!("{e:?}"),
    }
}

impl BrowserHost {
    async fn send(&self, url: &str, request: Option<&web_sys::Request>) -> Result<web_sys::Response, HostError> {
        let window = web_sys::window().ok_or(HostError::NoWindow)?;
        let promise = match request {
            Some(req) => window.fetch_with_request(req),
            None => window.fetch_with_str(url),
        };
        let response: web_sys::Response = JsFuture::from(promise)
            .await
            .map_err(|e| request_error(url, e))?
            .dyn_into()
            .map_err(|e| request_error(url, e))?;
        if !response.ok() {
            return Err(HostError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }
}

#[async_trait(?Send)]
impl HostServices for BrowserHost {
    async fn fetch_text(&self, url: &str) -> Result<String, HostError> {
        let response = self.send(url, None).await?;
        let text = JsFuture::from(response.text().map_err(|e| body_error(url, e))?)
            .await
            .map_err(|e| body_error(url, e))?;
        text.as_string().ok_or_else(|| HostError::Body {
            url: url.to_string(),
            reason: "response text was not a string".into(),
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, HostError> {
        let response = self.send(url, None).await?;
        let buffer = JsFuture::from(response.array_buffer().map_err(|e| body_error(url, e))?)
            .await
            .map_err(|e| body_error(url, e))?;
        Ok(js_sys::Uint8Array::new(&buffer).to_vec())
    }

    async fn post_json(&self, url: &str, body: &str) -> Result<(), HostError> {
        let headers = web_sys::Headers::new().map_err(|e| request_error(url, e))?;
        headers
            .set("Content-Type", "application/json")
            .map_err(|e| request_error(url, e))?;
        let init = web_sys::RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(body));
        let request = web_sys::Request::new_with_str_and_init(url, &init)
            .map_err(|e| request_error(url, e))?;
        self.send(url, Some(&request)).await?;
        Ok(())
    }
}
