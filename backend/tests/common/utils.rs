use axum::response::Response;
use http_body_util::BodyExt;

/// Multipart boundary used by test requests
const BOUNDARY: &str = "peekonce-test-boundary";

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Builds a `multipart/form-data` body with a single file field
pub fn multipart_body(
    field: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> (&'static str, Vec<u8>) {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    (BOUNDARY, body)
}

/// Generate test image data of the given size
pub fn generate_test_image(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}
