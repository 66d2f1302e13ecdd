//! PR lookup against a mocked GitHub REST API.

use chrono::{TimeZone, Utc};
use blog_material_gen::error::GitHubError;
use blog_material_gen::github::{GitHubPrLookup, PrLookup, fetch_pr_for_branch};
use octocrab::Octocrab;
use serde_json::{Map, Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OWNER: &str = "acme";
const REPO: &str = "app";
const DAILY: &str = "daily/2024-01-15";

fn mock_client(server: &MockServer) -> Octocrab {
    Octocrab::builder()
        .base_uri(server.uri())
        .expect("Failed to set base URI")
        .build()
        .expect("Failed to build octocrab")
}

fn mock_user(login: &str, id: u64) -> Value {
    let api = format!("https://api.github.com/users/{}", login);
    let mut user = Map::new();
    user.insert("login".into(), json!(login));
    user.insert("id".into(), json!(id));
    user.insert("node_id".into(), json!(format!("U_{}", id)));
    user.insert("avatar_url".into(), json!(format!("https://avatars.githubusercontent.com/u/{}", id)));
    user.insert("gravatar_id".into(), json!(""));
    user.insert("url".into(), json!(api));
    user.insert("html_url".into(), json!(format!("https://github.com/{}", login)));
    for (key, suffix) in [
        ("followers_url", "/followers"),
        ("following_url", "/following{/other_user}"),
        ("gists_url", "/gists{/gist_id}"),
        ("starred_url", "/starred{/owner}{/repo}"),
        ("subscriptions_url", "/subscriptions"),
        ("organizations_url", "/orgs"),
        ("repos_url", "/repos"),
        ("events_url", "/events{/privacy}"),
        ("received_events_url", "/received_events"),
    ] {
        user.insert(key.into(), json!(format!("{}{}", api, suffix)));
    }
    user.insert("type".into(), json!("User"));
    user.insert("site_admin".into(), json!(false));
    Value::Object(user)
}

fn mock_repo() -> Value {
    let api = format!("https://api.github.com/repos/{}/{}", OWNER, REPO);
    let mut repo = Map::new();
    repo.insert("id".into(), json!(1));
    repo.insert("node_id".into(), json!("R_1"));
    repo.insert("name".into(), json!(REPO));
    repo.insert("full_name".into(), json!(format!("{}/{}", OWNER, REPO)));
    repo.insert("owner".into(), mock_user(OWNER, 1));
    repo.insert("private".into(), json!(false));
    repo.insert("html_url".into(), json!(format!("https://github.com/{}/{}", OWNER, REPO)));
    repo.insert("description".into(), json!("Blog fixture"));
    repo.insert("fork".into(), json!(false));
    repo.insert("url".into(), json!(api));
    for (key, suffix) in [
        ("forks_url", "/forks"),
        ("keys_url", "/keys{/key_id}"),
        ("collaborators_url", "/collaborators{/collaborator}"),
        ("teams_url", "/teams"),
        ("hooks_url", "/hooks"),
        ("issue_events_url", "/issues/events{/number}"),
        ("events_url", "/events"),
        ("assignees_url", "/assignees{/user}"),
        ("branches_url", "/branches{/branch}"),
        ("tags_url", "/tags"),
        ("blobs_url", "/git/blobs{/sha}"),
        ("git_tags_url", "/git/tags{/sha}"),
        ("git_refs_url", "/git/refs{/sha}"),
        ("trees_url", "/git/trees{/sha}"),
        ("statuses_url", "/statuses/{sha}"),
        ("languages_url", "/languages"),
        ("stargazers_url", "/stargazers"),
        ("contributors_url", "/contributors"),
        ("subscribers_url", "/subscribers"),
        ("subscription_url", "/subscription"),
        ("commits_url", "/commits{/sha}"),
        ("git_commits_url", "/git/commits{/sha}"),
        ("comments_url", "/comments{/number}"),
        ("issue_comment_url", "/issues/comments{/number}"),
        ("contents_url", "/contents/{+path}"),
        ("compare_url", "/compare/{base}...{head}"),
        ("merges_url", "/merges"),
        ("archive_url", "/{archive_format}{/ref}"),
        ("downloads_url", "/downloads"),
        ("issues_url", "/issues{/number}"),
        ("pulls_url", "/pulls{/number}"),
        ("milestones_url", "/milestones{/number}"),
        ("notifications_url", "/notifications{?since,all,participating}"),
        ("labels_url", "/labels{/name}"),
        ("releases_url", "/releases{/id}"),
        ("deployments_url", "/deployments"),
    ] {
        repo.insert(key.into(), json!(format!("{}{}", api, suffix)));
    }
    Value::Object(repo)
}

fn branch_ref(name: &str) -> Value {
    json!({
        "label": format!("{}:{}", OWNER, name),
        "ref": name,
        "sha": "abc123def456789",
        "user": mock_user(OWNER, 1),
        "repo": mock_repo()
    })
}

/// A merged PR from `head` into the daily branch.
fn mock_pr(number: u64, head: &str, body: &str, labels: &[&str]) -> Value {
    let api = format!("https://api.github.com/repos/{}/{}", OWNER, REPO);
    let html = format!("https://github.com/{}/{}/pull/{}", OWNER, REPO, number);
    let merged_at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap().to_rfc3339();
    let labels: Vec<Value> = labels
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "id": i + 1,
                "node_id": format!("L_{}", i + 1),
                "url": format!("{}/labels/{}", api, name),
                "name": name,
                "color": "0e8a16",
                "default": false
            })
        })
        .collect();

    let mut pr = Map::new();
    pr.insert("url".into(), json!(format!("{}/pulls/{}", api, number)));
    pr.insert("id".into(), json!(number * 1000));
    pr.insert("node_id".into(), json!(format!("PR_{}", number)));
    pr.insert("html_url".into(), json!(html));
    pr.insert("diff_url".into(), json!(format!("{}.diff", html)));
    pr.insert("patch_url".into(), json!(format!("{}.patch", html)));
    pr.insert("issue_url".into(), json!(format!("{}/issues/{}", api, number)));
    pr.insert("commits_url".into(), json!(format!("{}/pulls/{}/commits", api, number)));
    pr.insert("review_comments_url".into(), json!(format!("{}/pulls/{}/comments", api, number)));
    pr.insert("review_comment_url".into(), json!(format!("{}/pulls/comments{{/number}}", api)));
    pr.insert("comments_url".into(), json!(format!("{}/issues/{}/comments", api, number)));
    pr.insert("statuses_url".into(), json!(format!("{}/statuses/abc123", api)));
    pr.insert("number".into(), json!(number));
    pr.insert("state".into(), json!("closed"));
    pr.insert("locked".into(), json!(false));
    pr.insert("title".into(), json!(format!("Merge {}", head)));
    pr.insert("body".into(), json!(body));
    pr.insert("user".into(), mock_user("dev", 100));
    pr.insert("labels".into(), json!(labels));
    pr.insert("assignee".into(), Value::Null);
    pr.insert("assignees".into(), json!([]));
    pr.insert("requested_reviewers".into(), json!([]));
    pr.insert("requested_teams".into(), json!([]));
    pr.insert("milestone".into(), Value::Null);
    pr.insert("created_at".into(), json!("2024-01-14T00:00:00Z"));
    pr.insert("updated_at".into(), json!("2024-01-15T09:30:00Z"));
    pr.insert("closed_at".into(), json!(merged_at));
    pr.insert("merged_at".into(), json!(merged_at));
    pr.insert("merge_commit_sha".into(), json!("abc123def456"));
    pr.insert("head".into(), branch_ref(head));
    pr.insert("base".into(), branch_ref(DAILY));
    pr.insert("draft".into(), json!(false));
    pr.insert("merged".into(), json!(true));
    pr.insert("merged_by".into(), mock_user("lead", 200));
    pr.insert("comments".into(), json!(0));
    pr.insert("review_comments".into(), json!(0));
    pr.insert("commits".into(), json!(3));
    pr.insert("additions".into(), json!(10));
    pr.insert("deletions".into(), json!(2));
    pr.insert("changed_files".into(), json!(2));
    Value::Object(pr)
}

async fn mount_pulls(server: &MockServer, head: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/{}/pulls", OWNER, REPO)))
        .and(query_param("state", "all"))
        .and(query_param("head", format!("{}:{}", OWNER, head)))
        .and(query_param("base", DAILY))
        .and(query_param("per_page", "1"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pr_found_for_branch() {
    let server = MockServer::start().await;
    let pr = mock_pr(7, "feature-search", "## 요구사항\n검색", &["enhancement", "blog"]);
    mount_pulls(
        &server,
        "feature-search",
        ResponseTemplate::new(200).set_body_json(vec![pr]),
    )
    .await;

    let client = mock_client(&server);
    let info = fetch_pr_for_branch(&client, OWNER, REPO, "feature-search", DAILY)
        .await
        .unwrap()
        .expect("PR should be found");

    assert_eq!(info.number, 7);
    assert_eq!(info.title, "Merge feature-search");
    assert_eq!(info.body, "## 요구사항\n검색");
    assert_eq!(info.url, "https://github.com/acme/app/pull/7");
    assert_eq!(info.labels, vec!["enhancement", "blog"]);
    assert_eq!(
        info.merged_at,
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap())
    );
}

#[tokio::test]
async fn test_no_pr_for_branch() {
    let server = MockServer::start().await;
    mount_pulls(
        &server,
        "feature-login",
        ResponseTemplate::new(200).set_body_json(Vec::<Value>::new()),
    )
    .await;

    let client = mock_client(&server);
    let info = fetch_pr_for_branch(&client, OWNER, REPO, "feature-login", DAILY)
        .await
        .unwrap();
    assert!(info.is_none());
}

#[tokio::test]
async fn test_long_body_is_truncated() {
    let server = MockServer::start().await;
    let body = "가".repeat(20 * 1024);
    mount_pulls(
        &server,
        "feature-search",
        ResponseTemplate::new(200).set_body_json(vec![mock_pr(8, "feature-search", &body, &[])]),
    )
    .await;

    let client = mock_client(&server);
    let info = fetch_pr_for_branch(&client, OWNER, REPO, "feature-search", DAILY)
        .await
        .unwrap()
        .unwrap();

    assert!(info.body.ends_with("... [truncated]"));
    assert_eq!(
        info.body.chars().count(),
        10 * 1024 + "... [truncated]".len()
    );
}

#[tokio::test]
async fn test_missing_repository_error() {
    let server = MockServer::start().await;
    mount_pulls(
        &server,
        "feature-search",
        ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })),
    )
    .await;

    let client = mock_client(&server);
    let err = fetch_pr_for_branch(&client, OWNER, REPO, "feature-search", DAILY)
        .await
        .unwrap_err();
    assert!(matches!(err, GitHubError::RepositoryNotFound { .. }));
}

#[tokio::test]
async fn test_lookup_degrades_to_none_on_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;

    let lookup = GitHubPrLookup::new(mock_client(&server), OWNER, REPO);
    assert!(lookup.find_pr("feature-search", DAILY).await.is_none());
}
