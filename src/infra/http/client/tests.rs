use std::num::NonZeroU32;

use httpmock::MockServer;

use super::*;
use crate::domain::query::{DEFAULT_PAGE_SIZE, Location};

const ACCOUNT: &str = "0b3f6f8e-2f5e-4f53-8a51-5f0a2b1f9c11";
const POST: &str = "4a4c3e4e-7c43-4c53-9e65-0c1ad0f6f1aa";

fn client(server: &MockServer) -> ApiClient {
    let base = Url::parse(&server.base_url()).expect("base url");
    ApiClient::new(&base).expect("client")
}

fn listing_body(page: u32) -> String {
    format!(
        r#"{{"data":[{{"id":"{POST}","account_id":"{ACCOUNT}","account_name":"yasir","contents":"<p>hi</p>"}}],"page":{page},"page_size":3,"page_total":2,"total":5}}"#
    )
}

fn query(location: &str) -> QueryState {
    QueryState::from_location(&Location::new(location), DEFAULT_PAGE_SIZE)
}

#[tokio::test]
async fn list_posts_sends_page_parameters() -> Result<(), FetchError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/posts")
            .query_param("page", "2")
            .query_param("page_size", "3");
        then.status(200)
            .header("content-type", "application/json")
            .body(listing_body(2));
    });

    let page = client(&server)
        .list_posts(&query("/posts?page=2"))
        .await?;

    mock.assert();
    assert_eq!(page.page, 2);
    assert_eq!(page.page_total, 2);
    assert_eq!(page.data[0].account_id.to_string(), ACCOUNT);
    Ok(())
}

#[tokio::test]
async fn list_posts_scopes_filter_to_contents() -> Result<(), FetchError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/posts")
            .query_param("page", "1")
            .query_param("filters[contents]", "hello world");
        then.status(200)
            .header("content-type", "application/json")
            .body(listing_body(1));
    });

    client(&server)
        .list_posts(&query("/posts?contents=hello+world"))
        .await?;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn list_posts_maps_failure_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/posts");
        then.status(500).body(r#"{"error":"boom"}"#);
    });

    let err = client(&server)
        .list_posts(&QueryState::first_page(NonZeroU32::MIN))
        .await
        .expect_err("500 should fail");

    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.server_message().as_deref(), Some("boom"));
}

#[tokio::test]
async fn list_posts_rejects_malformed_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/posts");
        then.status(200).body("<html>");
    });

    let err = client(&server)
        .list_posts(&QueryState::first_page(DEFAULT_PAGE_SIZE))
        .await
        .expect_err("html is not a listing");
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let base = Url::parse("http://127.0.0.1:9/").expect("url");
    let err = ApiClient::new(&base)
        .expect("client")
        .list_posts(&QueryState::first_page(DEFAULT_PAGE_SIZE))
        .await
        .expect_err("nothing listens on the discard port");
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn delete_post_sends_bearer_token() -> Result<(), FetchError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("DELETE")
            .path(format!("/api/posts/{POST}"))
            .header("authorization", "Bearer tok.en.sig");
        then.status(204);
    });

    let id = Uuid::parse_str(POST).expect("uuid");
    client(&server).delete_post("tok.en.sig", id).await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn delete_post_reports_forbidden() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("DELETE");
        then.status(403).body(r#"{"error":"not the owner"}"#);
    });

    let err = client(&server)
        .delete_post("t", Uuid::new_v4())
        .await
        .expect_err("forbidden");
    assert_eq!(err.status_code(), Some(403));
}

#[tokio::test]
async fn get_post_unwraps_data_envelope() -> Result<(), FetchError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path(format!("/api/posts/{POST}"))
            .header("authorization", "Bearer t");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"data":{"id":"x","contents":"<p>draft</p>"}}"#);
    });

    let detail = client(&server)
        .get_post("t", Uuid::parse_str(POST).expect("uuid"))
        .await?;
    mock.assert();
    assert_eq!(detail.contents, "<p>draft</p>");
    Ok(())
}

#[tokio::test]
async fn create_and_update_send_contents_body() -> Result<(), FetchError> {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method("POST")
            .path("/api/posts")
            .header("authorization", "Bearer t")
            .json_body_includes(r#"{"contents":"<p>new</p>"}"#);
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"data":{"contents":"<p>new</p>"}}"#);
    });
    let update = server.mock(|when, then| {
        when.method("PUT")
            .path(format!("/api/posts/{POST}"))
            .json_body_includes(r#"{"contents":"<p>edit</p>"}"#);
        then.status(200);
    });

    let api = client(&server);
    let created = api.create_post("t", "<p>new</p>").await?;
    let updated = api
        .update_post("t", Uuid::parse_str(POST).expect("uuid"), "<p>edit</p>")
        .await?;

    create.assert();
    update.assert();
    assert_eq!(created["data"]["contents"], "<p>new</p>");
    assert_eq!(updated, serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn login_posts_credentials_without_auth_header() -> Result<(), FetchError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/api/login")
            .json_body_includes(r#"{"email":"me@example.com","password":"pw"}"#);
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"token":"a.b.c"}"#);
    });

    let response = client(&server)
        .login(&LoginRequest {
            email: "me@example.com".into(),
            password: "pw".into(),
        })
        .await?;

    mock.assert();
    assert_eq!(response.token.as_deref(), Some("a.b.c"));
    Ok(())
}

#[tokio::test]
async fn register_posts_account_fields() -> Result<(), FetchError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/api/accounts")
            .json_body_includes(r#"{"account_name":"yasir","email":"y@example.com"}"#);
        then.status(201)
            .header("content-type", "application/json")
            .body(r#"{"data":{"account_name":"yasir"}}"#);
    });

    client(&server)
        .register(&RegisterRequest {
            account_name: "yasir".into(),
            email: "y@example.com".into(),
            password: "Secret123".into(),
        })
        .await?;

    mock.assert();
    Ok(())
}

#[test]
fn base_without_trailing_slash_keeps_its_prefix() {
    let base = Url::parse("https://example.com/portfolio").expect("url");
    let api = ApiClient::new(&base).expect("client");
    assert_eq!(
        api.url("api/posts").expect("join").as_str(),
        "https://example.com/portfolio/api/posts"
    );
}
