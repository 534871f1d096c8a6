//! Stacks node API client against a mock HTTP server

use serde_json::json;
use stacks_did_resolver::config::HttpClientConfig;
use stacks_did_resolver::error::RegistryError;
use stacks_did_resolver::fqn::Fqn;
use stacks_did_resolver::registry::{RegistryClient, StacksApiClient, TxStatus};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> StacksApiClient {
    StacksApiClient::new(server.uri(), &HttpClientConfig::default()).unwrap()
}

#[tokio::test]
async fn test_fetch_transaction_adds_0x() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extended/v1/tx/0xabcd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tx_id": "0xabcd",
            "tx_status": "success",
            "tx_type": "contract_call",
            "contract_call": {
                "contract_id": "SP000000000000000000002Q6VF78.bns",
                "function_name": "name-register",
                "function_args": [{"name": "name", "hex": "0x0200000005616c696365", "type": "(buff 48)"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tx = client_for(&server).await.fetch_transaction("abcd").await.unwrap();
    assert_eq!(tx.tx_status, TxStatus::Success);
    assert_eq!(tx.contract_call.unwrap().function_name, "name-register");
}

#[tokio::test]
async fn test_missing_transaction_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/extended/v1/tx/0xdead"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "could not find transaction"})))
        .mount(&server)
        .await;

    let err = client_for(&server).await.fetch_transaction("0xdead").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_error_body_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/names/ghost.id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Name not found"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .fetch_name_info(&Fqn::new("ghost", "id"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(ref m) if m.contains("Name not found")));
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).await.fetch_current_block_height().await.unwrap_err();
    assert!(matches!(err, RegistryError::Transport(_)));
}

#[tokio::test]
async fn test_fetch_zonefile_by_hash_and_latest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/names/alice.id/zonefile/1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zonefile": "$ORIGIN alice.id\n"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/names/alice.id/zonefile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"zonefile": "$ORIGIN alice.id\n$TTL 60\n"})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let fqn = Fqn::new("alice", "id");
    assert_eq!(
        client.fetch_zonefile(&fqn, Some("0x1234")).await.unwrap(),
        "$ORIGIN alice.id\n"
    );
    assert_eq!(
        client.fetch_zonefile(&fqn, None).await.unwrap(),
        "$ORIGIN alice.id\n$TTL 60\n"
    );
}

#[tokio::test]
async fn test_name_info_and_owned_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/names/alice.id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
            "blockchain": "stacks",
            "expire_block": 0,
            "last_txid": "0x",
            "status": "name-register",
            "zonefile": "$ORIGIN alice.id\n",
            "zonefile_hash": "1234"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/addresses/stacks/SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"names": ["alice.id"]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/addresses/stacks/SP000000000000000000002Q6VF78"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let info = client.fetch_name_info(&Fqn::new("alice", "id")).await.unwrap();
    assert_eq!(info.owner, "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7");
    assert_eq!(info.last_txid, "0x");
    assert_eq!(info.zonefile_hash, "1234");

    assert_eq!(
        client
            .fetch_names_owned_by("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7")
            .await
            .unwrap(),
        vec!["alice.id".to_string()]
    );
    assert!(client
        .fetch_names_owned_by("SP000000000000000000002Q6VF78")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_tip_height() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "peer_version": 402653189u64,
            "stacks_tip_height": 151234
        })))
        .mount(&server)
        .await;

    assert_eq!(
        client_for(&server).await.fetch_current_block_height().await.unwrap(),
        151234
    );
}

#[tokio::test]
async fn test_signed_claim_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alice/profile.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"token": "a.b.c", "decodedToken": {}},
            {"token": "ignored"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bare/profile.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "d.e.f"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty/profile.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let base = server.uri();

    let envelope = client
        .fetch_signed_claim(&format!("{}/alice/profile.json", base))
        .await
        .unwrap();
    assert_eq!(envelope.token, "a.b.c");

    let envelope = client
        .fetch_signed_claim(&format!("{}/bare/profile.json", base))
        .await
        .unwrap();
    assert_eq!(envelope.token, "d.e.f");

    let err = client
        .fetch_signed_claim(&format!("{}/empty/profile.json", base))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidResponse(_)));
}
