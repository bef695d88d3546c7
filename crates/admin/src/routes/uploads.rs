//! Product image upload handler.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireWriter;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Uploaded {
    urls: Vec<String>,
}

/// `POST /api/upload`
///
/// Accepts up to eight files in `images` fields and returns their public
/// URLs in upload order.
#[instrument(skip(state, admin, multipart), fields(admin_id = %admin.id))]
pub async fn create(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Uploaded>)> {
    let urls = state.images().save_multipart(multipart).await?;
    Ok((StatusCode::CREATED, Json(Uploaded { urls })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };

    use crate::routes::test_support::Client;
    use crate::services::uploads::tests::{JPEG, PNG};

    const BOUNDARY: &str = "tonewood-test-boundary";

    /// Build a multipart body from `(field, filename, bytes)` parts.
    fn multipart(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (field, filename, bytes) in parts {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                     filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn stored_files(client: &Client) -> usize {
        std::fs::read_dir(client.upload_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_upload_stores_images() {
        let mut client = Client::logged_in("admin").await;
        let request = multipart(&[("images", "body.png", PNG), ("images", "neck.jpg", JPEG)]);

        let (status, body) = client.request(request).await;
        assert_eq!(status, StatusCode::CREATED);

        let urls = body["urls"].as_array().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].as_str().unwrap().ends_with(".png"));
        assert!(urls[1].as_str().unwrap().ends_with(".jpg"));
        assert_eq!(stored_files(&client), 2);
    }

    #[tokio::test]
    async fn test_one_bad_file_rejects_the_batch() {
        let mut client = Client::logged_in("admin").await;
        let request = multipart(&[
            ("images", "body.png", PNG),
            ("images", "evil.png", b"<svg onload=alert(1)>"),
        ]);

        let (status, body) = client.request(request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["error"].as_str().unwrap().contains("evil.png"));
        assert_eq!(stored_files(&client), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let mut client = Client::logged_in("admin").await;
        // Test config allows 1024 bytes per file
        let mut big = PNG.to_vec();
        big.resize(2048, 0);

        let (status, _) = client
            .request(multipart(&[("images", "huge.png", &big)]))
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(stored_files(&client), 0);
    }

    #[tokio::test]
    async fn test_request_without_images() {
        let mut client = Client::logged_in("admin").await;
        let (status, _) = client
            .request(multipart(&[("caption", "note.txt", b"hello")]))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_viewer_cannot_upload() {
        let mut client = Client::logged_in("viewer").await;
        let (status, _) = client
            .request(multipart(&[("images", "body.png", PNG)]))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(stored_files(&client), 0);
    }
}
