use std::net::SocketAddr;
use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use backend_storage::share_record::memory::InMemoryShareRecordStorage;
use peekonce_backend::{
    media_storage::mock::InMemoryObjectStore,
    server,
    share::{TokenIssuer, TokenRedeemer, UploadService},
    types::Environment,
};
use tokio::net::TcpListener;
use tower::ServiceExt;

use super::utils::multipart_body;

/// Origin used for share links in tests
pub const TEST_LINK_ORIGIN: &str = "https://peek.test";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Router wired to in-memory object and record stores
pub struct TestSetup {
    pub router: Router,
    pub environment: Environment,
    pub objects: Arc<InMemoryObjectStore>,
    pub records: Arc<InMemoryShareRecordStorage>,
    pub redeemer: Arc<TokenRedeemer>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_environment(Environment::Development {
            view_window_override: None,
        })
    }

    pub fn with_environment(environment: Environment) -> Self {
        setup_test_env();

        let objects = Arc::new(InMemoryObjectStore::new());
        let records = Arc::new(InMemoryShareRecordStorage::new());

        let issuer = TokenIssuer::new(records.clone(), TEST_LINK_ORIGIN);
        let upload_service = Arc::new(UploadService::new(objects.clone(), issuer));
        let redeemer = Arc::new(
            TokenRedeemer::new(records.clone())
                .with_display_secs(environment.view_window_secs()),
        );

        let router = server::router(environment.clone(), upload_service, redeemer.clone());

        Self {
            router,
            environment,
            objects,
            records,
            redeemer,
        }
    }

    /// Serves the router on an ephemeral local port
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let router = self.router.clone();

        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .expect("Test server failed");
        });

        addr
    }

    pub async fn send_upload_request(
        &self,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let (boundary, body) = multipart_body("file", file_name, content_type, data);

        let request = Request::builder()
            .uri("/v1/images")
            .method("POST")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_redeem_request(
        &self,
        token: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_post_request(&format!("/v1/shares/{token}/redeem"))
            .await
    }

    pub async fn send_post_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .body(Body::empty())?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    /// Uploads a small image and returns its token
    pub async fn upload_test_image(&self, data: &[u8]) -> String {
        let response = self
            .send_upload_request("cat.png", "image/png", data)
            .await
            .expect("Failed to send upload request");
        assert_eq!(response.status(), http::StatusCode::CREATED);

        let body = super::parse_response_body(response).await;
        body["token"]
            .as_str()
            .expect("upload response has no token")
            .to_string()
    }
}
