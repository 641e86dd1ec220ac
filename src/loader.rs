//! Remote map and sprite loading, and the selection report sink.
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::host::{DecodedImage, HostError, HostServices};
use crate::map_data::{MapParseError, parse_map};
use crate::model::{GridModel, MapOrigin, Position};
use crate::state::selection::{HIGHLIGHT_MARKER, SelectionReporter};
use crate::viewer::ViewerInbox;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    Parse(#[from] MapParseError),
}

async fn fetch_map<H: HostServices + ?Sized>(host: &H, url: &str) -> Result<GridModel, LoadError> {
    let text = host.fetch_text(url).await?;
    let doc = parse_map(&text)?;
    Ok(GridModel::load(&doc.rows))
}

/// Fetches and parses the map, falling back to the built-in grid on any failure.
pub async fn load_map<H: HostServices + ?Sized>(host: &H, url: &str) -> (GridModel, MapOrigin) {
    match fetch_map(host, url).await {
        Ok(grid) => {
            info!(url, width = grid.width(), height = grid.height(), "map loaded");
            (grid, MapOrigin::Remote)
        }
        Err(e) => {
            warn!(url, error = %e, "map unavailable, using fallback grid");
            (GridModel::fallback(), MapOrigin::Fallback)
        }
    }
}

/// Downloads and decodes the tank sprite. `None` leaves tanks untextured.
pub async fn load_sprite<H: HostServices + ?Sized>(host: &H, url: &str) -> Option<DecodedImage> {
    let result = async {
        let bytes = host.fetch_bytes(url).await?;
        host.decode_image(&bytes).await
    }
    .await;
    match result {
        Ok(image) => {
            info!(url, width = image.width, height = image.height, "sprite decoded");
            Some(image)
        }
        Err(e) => {
            warn!(url, error = %e, "sprite unavailable, tanks will not be textured");
            None
        }
    }
}

/// Loads the map and then the sprite, publishing each to the viewer as soon as it is ready.
/// An empty sprite URL skips the download.
pub async fn load_into<H: HostServices + ?Sized>(
    host: &H,
    map_url: &str,
    sprite_url: &str,
    inbox: &ViewerInbox,
) {
    let (grid, origin) = load_map(host, map_url).await;
    inbox.publish_map(grid, origin);
    if sprite_url.is_empty() {
        return;
    }
    if let Some(image) = load_sprite(host, sprite_url).await {
        inbox.publish_sprite(image);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightReport {
    pub x: u32,
    pub y: u32,
    pub highlight: u8,
}

impl From<Position> for HighlightReport {
    fn from(pos: Position) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            highlight: HIGHLIGHT_MARKER,
        }
    }
}

/// Sends one report. Failures are logged and swallowed.
pub async fn send_report<H: HostServices + ?Sized>(host: &H, url: &str, position: Position) {
    let body = match serde_json::to_string(&HighlightReport::from(position)) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "could not encode selection report");
            return;
        }
    };
    if let Err(e) = host.post_json(url, &body).await {
        warn!(url, x = position.x, y = position.y, error = %e, "selection report failed");
    }
}

/// Posts each selection on a detached task; the caller never waits for the outcome.
pub struct HttpReporter<H: HostServices + 'static> {
    host: Rc<H>,
    url: String,
}

impl<H: HostServices + 'static> HttpReporter<H> {
    pub fn new(host: Rc<H>, url: impl Into<String>) -> Self {
        Self {
            host,
            url: url.into(),
        }
    }
}

impl<H: HostServices + 'static> SelectionReporter for HttpReporter<H> {
    fn notify_selection(&self, position: Position) {
        let host = self.host.clone();
        let url = self.url.clone();
        wasm_bindgen_futures::spawn_local(async move {
            send_report(host.as_ref(), &url, position).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::model::GridCell;

    #[derive(Default)]
    struct FakeHost {
        texts: HashMap<String, String>,
        bytes: HashMap<String, Vec<u8>>,
        reject_posts: bool,
        posts: RefCell<Vec<(String, String)>>,
    }

    fn missing(url: &str) -> HostError {
        HostError::Status {
            url: url.to_string(),
            status: 404,
        }
    }

    #[async_trait(?Send)]
    impl HostServices for FakeHost {
        async fn fetch_text(&self, url: &str) -> Result<String, HostError> {
            self.texts.get(url).cloned().ok_or_else(|| missing(url))
        }

        async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, HostError> {
            self.bytes.get(url).cloned().ok_or_else(|| missing(url))
        }

        async fn post_json(&self, url: &str, body: &str) -> Result<(), HostError> {
            self.posts
                .borrow_mut()
                .push((url.to_string(), body.to_string()));
            if self.reject_posts {
                return Err(HostError::Status {
                    url: url.to_string(),
                    status: 500,
                });
            }
            Ok(())
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 255, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn remote_map_is_parsed() {
        let mut host = FakeHost::default();
        host.texts.insert("/map".into(), "x,o\n1,\n".into());
        let (grid, origin) = load_map(&host, "/map").await;
        assert_eq!(origin, MapOrigin::Remote);
        assert_eq!((grid.width(), grid.height()), (2, 2));
        assert_eq!(grid.cell_at(0, 0), Some(GridCell::Tank));
        assert_eq!(grid.cell_at(1, 1), Some(GridCell::Empty));
    }

    #[tokio::test]
    async fn fetch_failure_falls_back() {
        let host = FakeHost::default();
        let (grid, origin) = load_map(&host, "/map").await;
        assert_eq!(origin, MapOrigin::Fallback);
        assert_eq!(grid, GridModel::fallback());
    }

    #[tokio::test]
    async fn unparseable_map_falls_back() {
        let mut host = FakeHost::default();
        host.texts.insert("/map".into(), "{\"rows\": 3}".into());
        let (_, origin) = load_map(&host, "/map").await;
        assert_eq!(origin, MapOrigin::Fallback);
    }

    #[tokio::test]
    async fn sprite_is_decoded_or_skipped() {
        let mut host = FakeHost::default();
        host.bytes.insert("/tank.png".into(), png(2, 3));
        host.bytes.insert("/broken.png".into(), vec![1, 2, 3]);
        let img = load_sprite(&host, "/tank.png").await.unwrap();
        assert_eq!((img.width, img.height), (2, 3));
        assert!(load_sprite(&host, "/broken.png").await.is_none());
        assert!(load_sprite(&host, "/absent.png").await.is_none());
    }

    #[tokio::test]
    async fn load_into_publishes_map_then_sprite() {
        let mut host = FakeHost::default();
        host.texts.insert("/map".into(), "[\"x \"]".into());
        host.bytes.insert("/tank.png".into(), png(1, 1));
        let inbox = ViewerInbox::default();
        load_into(&host, "/map", "/tank.png", &inbox).await;
        let (grid, origin) = inbox.take_map().unwrap();
        assert_eq!(origin, MapOrigin::Remote);
        assert_eq!(grid.width(), 2);
        assert!(inbox.take_sprite().is_some());
    }

    #[tokio::test]
    async fn empty_sprite_url_skips_download() {
        let host = FakeHost::default();
        let inbox = ViewerInbox::default();
        load_into(&host, "/map", "", &inbox).await;
        assert!(inbox.take_map().is_some());
        assert!(inbox.take_sprite().is_none());
    }

    #[tokio::test]
    async fn report_posts_grid_position_with_marker() {
        let host = FakeHost::default();
        send_report(&host, "/report", Position::new(3, 6)).await;
        assert_eq!(
            *host.posts.borrow(),
            vec![(
                "/report".to_string(),
                r#"{"x":3,"y":6,"highlight":1}"#.to_string()
            )]
        );
    }

    #[tokio::test]
    async fn report_failure_is_swallowed() {
        let host = FakeHost {
            reject_posts: true,
            ..FakeHost::default()
        };
        send_report(&host, "/report", Position::new(0, 0)).await;
        assert_eq!(host.posts.borrow().len(), 1);
    }
}
