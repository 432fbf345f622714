use std::sync::Arc;

use coffer_cli::{HttpRemote, TokenCache};
use coffer_core::api::entries::{CreateEntryRequest, EntriesDiffRequest, UpdateEntryRequest};
use coffer_core::services::{ApiError, EntriesApi};
use coffer_core::Meta;
use mockito::{Matcher, Server};
use serde_json::json;
use uuid::Uuid;

async fn remote(server: &Server, token: Option<&str>) -> HttpRemote {
    let tokens = Arc::new(TokenCache::new());
    if let Some(token) = token {
        tokens.set(token.to_string()).await;
    }
    HttpRemote::new(reqwest::Client::new(), &server.url(), tokens)
}

fn note_request() -> CreateEntryRequest {
    CreateEntryRequest {
        key: "k1".to_string(),
        entry_type: "note".to_string(),
        meta: Meta::new(),
        data: b"hello".to_vec(),
    }
}

#[tokio::test]
async fn create_sends_bearer_and_base64_payload() {
    let mut server = Server::new_async().await;
    let id = Uuid::now_v7();
    let mock = server
        .mock("POST", "/v1/entries")
        .match_header("authorization", "Bearer token-1")
        .match_body(Matcher::PartialJson(json!({
            "key": "k1",
            "type": "note",
            "data": "aGVsbG8="
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": id, "version": 1, "key": "k1" }).to_string())
        .create_async()
        .await;

    let remote = remote(&server, Some("token-1")).await;
    let created = remote.create_entry(&note_request()).await.expect("create");
    assert_eq!(created.id, id);
    assert_eq!(created.version, 1);
    assert_eq!(created.key.as_deref(), Some("k1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_token_fails_without_a_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/entries/diff")
        .expect(0)
        .create_async()
        .await;

    let remote = remote(&server, None).await;
    let result = remote
        .get_entries_diff(&EntriesDiffRequest::default())
        .await;
    assert!(matches!(result, Err(ApiError::Unauthenticated)));
    mock.assert_async().await;
}

#[tokio::test]
async fn error_bodies_map_to_api_errors() {
    let mut server = Server::new_async().await;
    let id = Uuid::now_v7();
    server
        .mock("POST", "/v1/entries")
        .with_status(400)
        .with_body(
            json!({ "error": "invalid_argument", "details": ["key_required", "data_required"] })
                .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("PUT", format!("/v1/entries/{id}").as_str())
        .with_status(404)
        .with_body(json!({ "error": "not_found" }).to_string())
        .create_async()
        .await;
    server
        .mock("DELETE", format!("/v1/entries/{id}").as_str())
        .with_status(401)
        .with_body(json!({ "error": "unauthenticated" }).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/v1/entries/diff")
        .with_status(500)
        .with_body(json!({ "error": "internal" }).to_string())
        .create_async()
        .await;

    let remote = remote(&server, Some("t")).await;
    assert_eq!(
        remote.create_entry(&note_request()).await,
        Err(ApiError::Invalid(vec![
            "key_required".to_string(),
            "data_required".to_string()
        ]))
    );
    let update = UpdateEntryRequest {
        meta: Meta::new(),
        data: b"x".to_vec(),
        version: 1,
    };
    assert_eq!(
        remote.update_entry(id, &update).await,
        Err(ApiError::NotFound)
    );
    assert_eq!(
        remote.delete_entry(id).await,
        Err(ApiError::Unauthenticated)
    );
    assert_eq!(
        remote
            .get_entries_diff(&EntriesDiffRequest::default())
            .await
            .map(|diff| diff.entries.len()),
        Err(ApiError::Internal("internal".to_string()))
    );
}

#[tokio::test]
async fn diff_decodes_entries() {
    let mut server = Server::new_async().await;
    let known = Uuid::now_v7();
    let fresh = Uuid::now_v7();
    server
        .mock("POST", "/v1/entries/diff")
        .match_body(Matcher::PartialJson(json!({
            "client_versions": { (known.to_string()): 3 }
        })))
        .with_status(200)
        .with_body(
            json!({
                "create_ids": [fresh],
                "update_ids": [],
                "delete_ids": [known],
                "entries": [{
                    "id": fresh,
                    "key": "wifi",
                    "type": "password",
                    "meta": {},
                    "data": "eyJsb2dpbiI6ImEiLCJwYXNzd29yZCI6ImIifQ==",
                    "version": 1,
                    "created_at": "2026-01-01T00:00:00Z",
                    "updated_at": "2026-01-01T00:00:00Z"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let remote = remote(&server, Some("t")).await;
    let request = EntriesDiffRequest {
        client_versions: [(known, 3)].into_iter().collect(),
    };
    let diff = remote.get_entries_diff(&request).await.expect("diff");
    assert_eq!(diff.create_ids, vec![fresh]);
    assert_eq!(diff.delete_ids, vec![known]);
    assert_eq!(diff.entries.len(), 1);
    assert_eq!(diff.entries[0].data, br#"{"login":"a","password":"b"}"#.to_vec());
}

#[tokio::test]
async fn login_returns_token_without_caching_it() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/auth/login")
        .match_body(Matcher::Json(json!({ "login": "alice", "password": "secret-pass" })))
        .with_status(200)
        .with_body(
            json!({ "access_token": "jwt", "expires_at": "2026-01-01T00:00:00Z" }).to_string(),
        )
        .create_async()
        .await;
    server
        .mock("POST", "/v1/auth/register")
        .with_status(409)
        .with_body(json!({ "error": "already_exists", "details": ["login_taken"] }).to_string())
        .create_async()
        .await;

    let tokens = Arc::new(TokenCache::new());
    let remote = HttpRemote::new(reqwest::Client::new(), &server.url(), Arc::clone(&tokens));
    let login = remote.login("alice", "secret-pass").await.expect("login");
    assert_eq!(login.access_token, "jwt");
    assert_eq!(tokens.get().await, None);

    let register = remote.register("alice", "secret-pass").await;
    assert!(matches!(register, Err(ApiError::AlreadyExists)));
}
