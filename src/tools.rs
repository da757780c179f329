//! Request builders and response normalizers behind each tool.
//!
//! Everything here is pure: parameters go in, an [`ApiRequest`] or a
//! normalized JSON value comes out. Network I/O lives in [`crate::client`].

use rmcp::schemars;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::client::{endpoint, ApiRequest};
use crate::error::{GithubToolError, Result};

pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 50;
pub const DEFAULT_LIMIT: i64 = 20;
pub const DEFAULT_REF: &str = "main";

/// Field GitHub sets on pull requests returned by the issues endpoint.
const PULL_REQUEST_KEY: &str = "pull_request";

/// Clamp a requested page size into `[MIN_LIMIT, MAX_LIMIT]`.
///
/// Out-of-range values are corrected, never rejected.
pub fn clamp_limit(limit: i64) -> u8 {
    limit.clamp(MIN_LIMIT, MAX_LIMIT) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
            IssueState::All => "all",
        }
    }
}

/// Validate an owner or repository name.
///
/// Names end up as single path segments, so anything that would change the
/// shape of the URL is rejected up front.
pub fn validate_name(name: &str, field: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GithubToolError::InvalidParam(format!(
            "{} must not be empty",
            field
        )));
    }
    for ch in ['/', '?', '#', '%', '\0', ' ', '\n', '\r', '\t'] {
        if name.contains(ch) {
            return Err(GithubToolError::InvalidParam(format!(
                "{} contains invalid character {:?}",
                field, ch
            )));
        }
    }
    if is_dot_segment(name) {
        return Err(GithubToolError::InvalidParam(format!(
            "{} must not be '.' or '..'",
            field
        )));
    }
    Ok(())
}

/// URL parsing collapses these, which would silently change the endpoint.
fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GithubToolError::InvalidParam(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn repo_endpoint(base: &Url, owner: &str, repo: &str, rest: &[&str]) -> Result<Url> {
    validate_name(owner, "owner")?;
    validate_name(repo, "repo")?;
    endpoint(
        base,
        ["repos", owner, repo].into_iter().chain(rest.iter().copied()),
    )
}

pub fn get_repo_request(base: &Url, owner: &str, repo: &str) -> Result<ApiRequest> {
    Ok(ApiRequest::get(repo_endpoint(base, owner, repo, &[])?))
}

pub fn list_issues_request(
    base: &Url,
    owner: &str,
    repo: &str,
    state: IssueState,
    limit: i64,
) -> Result<ApiRequest> {
    let url = repo_endpoint(base, owner, repo, &["issues"])?;
    Ok(ApiRequest::get(url)
        .query("state", state.as_str())
        .query("per_page", &clamp_limit(limit).to_string()))
}

pub fn create_issue_request(
    base: &Url,
    owner: &str,
    repo: &str,
    title: &str,
    body: &str,
) -> Result<ApiRequest> {
    require_non_empty(title, "title")?;
    let url = repo_endpoint(base, owner, repo, &["issues"])?;
    Ok(ApiRequest::post(
        url,
        serde_json::json!({ "title": title, "body": body }),
    ))
}

pub fn get_file_request(
    base: &Url,
    owner: &str,
    repo: &str,
    path: &str,
    git_ref: &str,
) -> Result<ApiRequest> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(GithubToolError::InvalidParam(
            "path must not be empty".to_string(),
        ));
    }
    if segments.iter().any(|s| is_dot_segment(s)) {
        return Err(GithubToolError::InvalidParam(format!(
            "path '{}' must not contain '.' or '..' segments",
            path
        )));
    }
    require_non_empty(git_ref, "ref")?;

    let mut rest = vec!["contents"];
    rest.extend(segments);
    let url = repo_endpoint(base, owner, repo, &rest)?;
    Ok(ApiRequest::get(url).query("ref", git_ref))
}

/// Scope a free-text code search to a single repository.
pub fn search_qualifier(owner: &str, repo: &str, query: &str) -> String {
    format!("repo:{}/{} {}", owner, repo, query).trim().to_string()
}

pub fn search_code_request(
    base: &Url,
    owner: &str,
    repo: &str,
    query: &str,
    limit: i64,
) -> Result<ApiRequest> {
    validate_name(owner, "owner")?;
    validate_name(repo, "repo")?;
    let url = endpoint(base, ["search", "code"])?;
    Ok(ApiRequest::get(url)
        .query("q", &search_qualifier(owner, repo, query))
        .query("per_page", &clamp_limit(limit).to_string()))
}

/// Decode an issues-endpoint page and drop the pull requests mixed into it.
///
/// The page itself must be an array; entries that are not objects are dropped
/// along with pull requests. Server order is preserved.
pub fn issues_only(raw: Value) -> Result<Vec<Value>> {
    let items: Vec<Value> = serde_json::from_value(raw)?;
    Ok(items
        .into_iter()
        .filter(|item| {
            item.as_object()
                .is_some_and(|fields| !fields.contains_key(PULL_REQUEST_KEY))
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchPayload {
    Hits { items: Vec<Value> },
    Unexpected(Value),
}

/// Extract the `items` array of a search response.
///
/// Search is the one call that degrades instead of failing: any response
/// without a list-valued `items` field yields an empty list.
pub fn search_items(raw: Value) -> Vec<Value> {
    match serde_json::from_value(raw) {
        Ok(SearchPayload::Hits { items }) => items,
        Ok(SearchPayload::Unexpected(other)) => {
            tracing::debug!(kind = json_kind(&other), "Search response had no items list");
            Vec::new()
        }
        Err(_) => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("https://api.github.com").unwrap()
    }

    #[test]
    fn test_clamp_limit_boundaries() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(1), 1);
        assert_eq!(clamp_limit(50), 50);
        assert_eq!(clamp_limit(51), 50);
        assert_eq!(clamp_limit(-5), 1);
        assert_eq!(clamp_limit(20), 20);
        assert_eq!(clamp_limit(i64::MAX), 50);
        assert_eq!(clamp_limit(i64::MIN), 1);
    }

    #[test]
    fn test_issue_state_wire_names() {
        let state: IssueState = serde_json::from_value(json!("closed")).unwrap();
        assert_eq!(state, IssueState::Closed);
        assert_eq!(IssueState::default().as_str(), "open");
        assert!(serde_json::from_value::<IssueState>(json!("merged")).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("octo", "owner").is_ok());
        assert!(validate_name("hello-world.rs", "repo").is_ok());
        assert!(validate_name("", "owner").is_err());
        assert!(validate_name("octo/evil", "owner").is_err());
        assert!(validate_name("repo?x=1", "repo").is_err());
        assert!(validate_name("repo#frag", "repo").is_err());
        assert!(validate_name("my repo", "repo").is_err());
        assert!(validate_name("%2e%2e", "repo").is_err());
        assert!(validate_name("..", "owner").is_err());
        assert!(validate_name(".", "repo").is_err());
        assert!(validate_name(".github", "repo").is_ok());
        assert!(validate_name("...", "repo").is_ok());
    }

    #[test]
    fn test_get_repo_request() {
        let request = get_repo_request(&base(), "octo", "hello-world").unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url.as_str(),
            "https://api.github.com/repos/octo/hello-world"
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn test_list_issues_request_clamps_limit() {
        let request =
            list_issues_request(&base(), "octo", "hello-world", IssueState::All, 500).unwrap();
        assert_eq!(
            request.url.as_str(),
            "https://api.github.com/repos/octo/hello-world/issues?state=all&per_page=50"
        );
    }

    #[test]
    fn test_create_issue_request_body() {
        let request =
            create_issue_request(&base(), "octo", "hello-world", "Crash on start", "").unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            request.body,
            Some(json!({"title": "Crash on start", "body": ""}))
        );
    }

    #[test]
    fn test_create_issue_request_requires_title() {
        let err = create_issue_request(&base(), "octo", "hello-world", "  ", "body").unwrap_err();
        assert!(matches!(err, GithubToolError::InvalidParam(_)));
    }

    #[test]
    fn test_get_file_request_nested_path() {
        let request =
            get_file_request(&base(), "octo", "hello-world", "/src/bin/main.rs", "v1.0").unwrap();
        assert_eq!(
            request.url.as_str(),
            "https://api.github.com/repos/octo/hello-world/contents/src/bin/main.rs?ref=v1.0"
        );
    }

    #[test]
    fn test_get_file_request_requires_path() {
        assert!(get_file_request(&base(), "octo", "hello-world", "", "main").is_err());
        assert!(get_file_request(&base(), "octo", "hello-world", "//", "main").is_err());
        assert!(get_file_request(&base(), "octo", "hello-world", "a/../b.txt", "main").is_err());
        assert!(get_file_request(&base(), "octo", "hello-world", "./README.md", "main").is_err());
        assert!(get_file_request(&base(), "octo", "hello-world", "..", "main").is_err());
    }

    #[test]
    fn test_dot_owner_does_not_shift_endpoint() {
        let err = get_repo_request(&base(), "..", "hello-world").unwrap_err();
        assert!(matches!(err, GithubToolError::InvalidParam(_)));
        let err = search_code_request(&base(), "octo", ".", "fn main", 20).unwrap_err();
        assert!(matches!(err, GithubToolError::InvalidParam(_)));
    }

    #[test]
    fn test_get_file_request_allows_dotfiles() {
        let request =
            get_file_request(&base(), "octo", "hello-world", ".github/workflows/ci.yml", "main")
                .unwrap();
        assert_eq!(
            request.url.path(),
            "/repos/octo/hello-world/contents/.github/workflows/ci.yml"
        );
    }

    #[test]
    fn test_search_qualifier_is_trimmed() {
        assert_eq!(
            search_qualifier("octo", "hello-world", "fn main"),
            "repo:octo/hello-world fn main"
        );
        assert_eq!(
            search_qualifier("octo", "hello-world", ""),
            "repo:octo/hello-world"
        );
        assert_eq!(
            search_qualifier("octo", "hello-world", "todo  "),
            "repo:octo/hello-world todo"
        );
    }

    #[test]
    fn test_search_code_request() {
        let request = search_code_request(&base(), "octo", "hello-world", "fn main", 0).unwrap();
        let pairs: Vec<(String, String)> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(request.url.path(), "/search/code");
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "repo:octo/hello-world fn main".to_string()),
                ("per_page".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_issues_only_drops_pull_requests() {
        let raw = json!([
            {"number": 1},
            {"number": 2, "pull_request": {"url": "x"}},
            {"number": 3},
            "not an object",
            {"number": 4, "pull_request": null},
            {"number": 5},
        ]);
        let issues = issues_only(raw).unwrap();
        let numbers: Vec<i64> = issues.iter().map(|i| i["number"].as_i64().unwrap()).collect();
        assert_eq!(numbers, vec![1, 3, 5]);
        assert!(issues.iter().all(|i| i.get("pull_request").is_none()));
    }

    #[test]
    fn test_issues_only_rejects_non_array() {
        let err = issues_only(json!({"message": "weird"})).unwrap_err();
        assert!(matches!(err, GithubToolError::Parse(_)));
    }

    #[test]
    fn test_search_items_returns_items_verbatim() {
        let items = json!([{"path": "src/main.rs", "score": 1.0}, {"path": "README.md"}]);
        let raw = json!({"total_count": 2, "items": items.clone()});
        assert_eq!(Value::Array(search_items(raw)), items);
    }

    #[test]
    fn test_search_items_degrades_to_empty() {
        assert!(search_items(json!({"total_count": 0})).is_empty());
        assert!(search_items(json!({"items": "nope"})).is_empty());
        assert!(search_items(json!({"items": null})).is_empty());
        assert!(search_items(json!([{"path": "a"}])).is_empty());
        assert!(search_items(json!("text")).is_empty());
        assert!(search_items(Value::Null).is_empty());
    }
}
