//! Mock image CDN for E2E tests.
//!
//! Serves generated images, a watermark logo, and endpoints that fail
//! on purpose. Every request is counted per path.

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockCdnState {
    pub hits: HashMap<String, usize>,
}

pub struct MockCdn {
    pub base_url: String,
    pub state: Arc<Mutex<MockCdnState>>,
}

fn jpeg(color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 64, Rgb(color));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
        .expect("encode jpeg");
    out
}

fn logo_png() -> Vec<u8> {
    let logo = RgbaImage::from_fn(16, 16, |x, _| {
        if x < 8 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut out = Vec::new();
    logo.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode png");
    out
}

async fn serve(req: HttpRequest, state: web::Data<Arc<Mutex<MockCdnState>>>) -> HttpResponse {
    let path = req.path().to_string();
    let hits = {
        let mut state = state.lock().unwrap();
        let counter = state.hits.entry(path.clone()).or_insert(0);
        *counter += 1;
        *counter
    };

    if path == "/logo.png" {
        return HttpResponse::Ok().content_type("image/png").body(logo_png());
    }
    if path.starts_with("/broken/") {
        return HttpResponse::InternalServerError().finish();
    }
    // Fails twice, then recovers.
    if path.starts_with("/flaky/") && hits <= 2 {
        return HttpResponse::ServiceUnavailable().finish();
    }
    if path.starts_with("/img/") || path.starts_with("/flaky/") {
        return HttpResponse::Ok()
            .content_type("image/jpeg")
            .body(jpeg([0, 0, 255]));
    }
    HttpResponse::NotFound().finish()
}

impl MockCdn {
    /// Start the mock CDN on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockCdnState::default()));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let state_data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state_data.clone()))
                .default_service(web::get().to(serve))
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        tokio::spawn(server);

        Self { base_url, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .hits
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.lock().unwrap().hits.values().sum()
    }
}
