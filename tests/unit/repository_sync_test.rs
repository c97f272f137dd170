//! Tests for RepositorySync against a mock GitHub contents API.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use dotpush::services::repository_sync::{decode_content, encode_content, RepositorySync};
use dotpush::types::credential::Credential;
use dotpush::types::errors::SyncError;
use dotpush::types::github::UserProfile;
use dotpush::types::settings::{GitHubSettings, RepositorySettings};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const URL: &str = "https://leetcode.com/problems/two-sum/description/";
const CODE: &str = "class Solution:\n    def twoSum(self, nums, target):\n        return [0, 1]";
const REPO_PATH: &str = "/repos/octocat/code-sync";
const FILE_PATH: &str = "/repos/octocat/code-sync/contents/leetcode/two-sum.py";

fn credential() -> Credential {
    Credential::from_profile("gho_abc", UserProfile::new("octocat"))
}

fn sync(server: &MockServer) -> RepositorySync {
    RepositorySync::new(
        GitHubSettings {
            api_base_url: server.uri(),
            ..Default::default()
        },
        RepositorySettings::default(),
    )
    .unwrap()
}

async fn repo_exists(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(REPO_PATH))
        .and(header("authorization", "Bearer gho_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "code-sync"})))
        .mount(server)
        .await;
}

fn put_response() -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({
        "content": {
            "path": "leetcode/two-sum.py",
            "html_url": "https://github.com/octocat/code-sync/blob/main/leetcode/two-sum.py"
        },
        "commit": {"sha": "7638417db6d59f3c431d3e1f261cc637155684cd"}
    }))
}

async fn put_body(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("a PUT request");
    serde_json::from_slice(&put.body).unwrap()
}

#[tokio::test]
async fn test_push_creates_new_file() {
    let server = MockServer::start().await;
    repo_exists(&server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .and(body_partial_json(json!({
            "message": "Add solution for two-sum",
            "branch": "main",
            "content": encode_content(CODE)
        })))
        .respond_with(put_response())
        .expect(1)
        .mount(&server)
        .await;

    let result = sync(&server)
        .push(&credential(), "code-sync", URL, CODE, "python")
        .await
        .unwrap();

    assert!(result.created);
    assert_eq!(result.path, "leetcode/two-sum.py");
    assert_eq!(
        result.html_url,
        "https://github.com/octocat/code-sync/blob/main/leetcode/two-sum.py"
    );
    assert_eq!(
        result.commit_sha.as_deref(),
        Some("7638417db6d59f3c431d3e1f261cc637155684cd")
    );
    assert!(result.warnings.is_empty());
    assert!(put_body(&server).await.get("sha").is_none());
}

#[tokio::test]
async fn test_push_preserves_multibyte_utf8() {
    let code = "def greet():\n    # café\n    return \"é中🙂\"\n";
    let server = MockServer::start().await;
    repo_exists(&server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .respond_with(put_response())
        .expect(1)
        .mount(&server)
        .await;

    sync(&server)
        .push(&credential(), "code-sync", URL, code, "python")
        .await
        .unwrap();

    let body = put_body(&server).await;
    let content = body["content"].as_str().unwrap();
    assert_eq!(BASE64.decode(content).unwrap(), code.as_bytes());
    assert_eq!(decode_content(content).unwrap(), code);
}

#[tokio::test]
async fn test_push_updates_existing_file_with_sha() {
    let server = MockServer::start().await;
    repo_exists(&server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3",
            "content": "b2xk\n"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .and(body_partial_json(json!({
            "message": "Update solution for two-sum",
            "sha": "95b966ae1c166bd92f8ae7d1c313e738c731dfc3"
        })))
        .respond_with(put_response())
        .expect(1)
        .mount(&server)
        .await;

    let result = sync(&server)
        .push(&credential(), "code-sync", URL, CODE, "python")
        .await
        .unwrap();
    assert!(!result.created);
}

#[tokio::test]
async fn test_missing_repository_is_created() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPO_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(body_partial_json(json!({
            "name": "code-sync",
            "private": false,
            "auto_init": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "code-sync"})))
        .expect(1)
        .mount(&server)
        .await;

    sync(&server)
        .ensure_repository(&credential(), "code-sync")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_repository_forbidden_is_repo_access_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(REPO_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Resource not accessible"})))
        .mount(&server)
        .await;

    match sync(&server).push(&credential(), "code-sync", URL, CODE, "python").await {
        Err(SyncError::RepoAccess(msg)) => assert_eq!(msg, "Resource not accessible (403)"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_response_without_content_is_unknown_error() {
    let server = MockServer::start().await;
    repo_exists(&server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": null})))
        .mount(&server)
        .await;

    match sync(&server).push(&credential(), "code-sync", URL, CODE, "python").await {
        Err(SyncError::Push(msg)) => assert_eq!(msg, "Unknown error"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_put_conflict_carries_github_message() {
    let server = MockServer::start().await;
    repo_exists(&server).await;
    Mock::given(method("GET"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(FILE_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "sha does not match"})))
        .mount(&server)
        .await;

    let err = sync(&server)
        .push(&credential(), "code-sync", URL, CODE, "python")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to push: sha does not match (409)");
}

#[tokio::test]
async fn test_short_code_is_rejected_without_network() {
    let server = MockServer::start().await;
    let err = sync(&server)
        .push(&credential(), "code-sync", URL, "  x=1 ", "python")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidCode(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_token_is_not_authenticated() {
    let server = MockServer::start().await;
    let mut credential = credential();
    credential.token.clear();
    let err = sync(&server)
        .push(&credential, "code-sync", URL, CODE, "python")
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotAuthenticated));
}

#[tokio::test]
async fn test_incomplete_code_is_pushed_with_warning() {
    let server = MockServer::start().await;
    repo_exists(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/code-sync/contents/leetcode/two-sum.java"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/code-sync/contents/leetcode/two-sum.java"))
        .respond_with(put_response())
        .mount(&server)
        .await;

    let code = "class Solution {\n    public int[] twoSum(int[] nums, int t) {\n        return new int";
    let result = sync(&server)
        .push(&credential(), "code-sync", URL, code, "java")
        .await
        .unwrap();
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("return new int"));
}

#[test]
fn test_remote_target_layout() {
    let sync = RepositorySync::new(
        GitHubSettings::default(),
        RepositorySettings {
            directory: "/solutions/".to_string(),
            ..Default::default()
        },
    )
    .unwrap();
    let target = sync.remote_target("octocat", "code-sync", URL, "c++");
    assert_eq!(target.path, "solutions/two-sum.cpp");
    assert_eq!(
        target.api_url,
        "https://api.github.com/repos/octocat/code-sync/contents/solutions/two-sum.cpp"
    );
    assert_eq!(
        target.html_url,
        "https://github.com/octocat/code-sync/blob/main/solutions/two-sum.cpp"
    );

    let fallback = sync.remote_target("octocat", "code-sync", "https://example.com/", "brainfuck");
    assert_eq!(fallback.path, "solutions/solution.txt");
}
