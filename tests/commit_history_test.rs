//! Commit collection over real repositories.

mod common;

use blog_material_gen::CommitType;
use blog_material_gen::git::commits::{fetch_commits, search_commits_by_keyword};
use blog_material_gen::git::{commits_for_branch, resolve_range};
use common::{DAILY, TestRepo, daily_fixture};

#[test]
fn test_resolve_range_by_branch_and_hash() {
    let t = TestRepo::new();
    let first = t.commit_on("refs/heads/main", "chore: init", &[("a.txt", "a")]);
    let second = t.commit_on("refs/heads/main", "feat: second", &[("b.txt", "b")]);

    let range = resolve_range(&t.repo, &first.to_string(), "main").unwrap();
    assert_eq!(range.from, first);
    assert_eq!(range.to, second);
    assert_eq!(range.to_ref, "main");
}

#[test]
fn test_resolve_range_unknown_reference() {
    let t = TestRepo::new();
    t.commit_on("refs/heads/main", "chore: init", &[("a.txt", "a")]);

    let err = resolve_range(&t.repo, "main", "nope").unwrap_err();
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_fetch_commits_newest_first_without_merges() {
    let t = daily_fixture();
    let base = t.repo.revparse_single("main").unwrap().id();
    let daily = t
        .repo
        .revparse_single(&format!("origin/{}", DAILY))
        .unwrap()
        .id();

    let commits = fetch_commits(&t.repo, base, daily).unwrap();

    // Two merge commits are skipped, six branch commits remain.
    assert_eq!(commits.len(), 6);
    assert!(commits.windows(2).all(|w| w[0].date >= w[1].date));
    assert!(commits.iter().all(|c| c.hash.len() == 7));
    assert_eq!(commits[0].author, "Test User");
}

#[test]
fn test_empty_range_yields_nothing() {
    let t = TestRepo::new();
    let only = t.commit_on("refs/heads/main", "chore: init", &[("a.txt", "a")]);
    assert!(fetch_commits(&t.repo, only, only).unwrap().is_empty());
}

#[test]
fn test_commits_for_branch_parses_conventional_subjects() {
    let t = daily_fixture();
    let commits = commits_for_branch(&t.repo, "feature-login", "main");

    assert_eq!(commits.len(), 3);
    let feat = commits
        .iter()
        .find(|c| c.commit_type == CommitType::Feat)
        .unwrap();
    assert_eq!(feat.scope.as_deref(), Some("auth"));
    assert_eq!(feat.files, vec!["login.rs"]);
}

#[test]
fn test_deleted_branch_falls_back_to_keyword_search() {
    let t = TestRepo::new();
    let base = t.commit_on("refs/heads/main", "chore: init", &[("a.txt", "a")]);
    t.branch(DAILY, base);
    t.commit_on(
        &format!("refs/heads/{}", DAILY),
        "feat: squash of feature-gone",
        &[("gone.ts", "x")],
    );

    let commits = commits_for_branch(&t.repo, "feature-gone", "main");
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].subject, "squash of feature-gone");

    let direct = search_commits_by_keyword(&t.repo, "feature-gone").unwrap();
    assert_eq!(direct.len(), 1);
    assert!(commits_for_branch(&t.repo, "feature-never", "main").is_empty());
}
