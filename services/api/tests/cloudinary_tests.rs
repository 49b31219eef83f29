use api_lib::{
    adapters::CloudinaryAdapter,
    config::{CloudinaryCredentials, SignatureAlgorithm},
};
use recipe_social_core::{
    domain::{UploadOptions, UploadSource},
    ports::{MediaStore, PortError},
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(server: &MockServer) -> CloudinaryAdapter {
    CloudinaryAdapter::new(
        reqwest::Client::new(),
        CloudinaryCredentials {
            cloud_name: "demo".into(),
            api_key: "key-123".into(),
            api_secret: "shh".into(),
            signature_algorithm: SignatureAlgorithm::Sha1,
        },
        &server.uri(),
    )
}

fn options() -> UploadOptions {
    UploadOptions {
        folder: "recipe-app".into(),
        transformation: Some("c_limit,h_1200,w_1200/q_auto/f_auto".into()),
    }
}

#[tokio::test]
async fn streams_bytes_and_normalizes_the_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "recipe-app/abc",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/recipe-app/abc.jpg",
            "width": 800,
            "height": 600,
            "format": "jpg",
            "bytes": 2048,
            "resource_type": "image",
            "created_at": "2024-06-01T12:00:00Z",
            "etag": "ignored"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = adapter(&server)
        .upload(
            UploadSource::Bytes {
                data: vec![1, 2, 3],
                file_name: "pie.jpg".into(),
                content_type: "image/jpeg".into(),
            },
            &options(),
        )
        .await
        .unwrap();

    assert_eq!(result.public_id, "recipe-app/abc");
    assert_eq!(result.width, Some(800));
    assert_eq!(result.bytes, 2048);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    for field in ["api_key", "signature", "timestamp", "folder", "transformation", "file"] {
        assert!(
            body.contains(&format!("name=\"{}\"", field)),
            "missing form field {}",
            field
        );
    }
    assert!(body.contains("recipe-app"));
}

#[tokio::test]
async fn data_uris_are_sent_as_the_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "public_id": "recipe-app/xyz",
            "secure_url": "https://res.cloudinary.com/demo/xyz.png"
        })))
        .mount(&server)
        .await;

    let uri = "data:image/png;base64,aGVsbG8=";
    let result = adapter(&server)
        .upload(UploadSource::DataUri(uri.into()), &options())
        .await
        .unwrap();
    assert_eq!(result.public_id, "recipe-app/xyz");
    assert_eq!(result.bytes, 0);

    let requests = server.received_requests().await.unwrap();
    assert!(String::from_utf8_lossy(&requests[0].body).contains(uri));
}

#[tokio::test]
async fn remote_errors_surface_cloudinarys_own_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": { "message": "Invalid Signature" } })),
        )
        .mount(&server)
        .await;

    let err = adapter(&server)
        .upload(
            UploadSource::Reference("https://example.com/pie.jpg".into()),
            &options(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, PortError::Remote("Invalid Signature".into()));
}

#[tokio::test]
async fn destroy_posts_the_public_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/destroy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = adapter(&server).destroy("recipe-app/abc").await.unwrap();
    assert_eq!(result.result, "ok");

    let requests = server.received_requests().await.unwrap();
    assert!(String::from_utf8_lossy(&requests[0].body).contains("recipe-app/abc"));
}
