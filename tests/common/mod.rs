//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::path::Path;

use git2::{FileMode, Oid, Repository, RepositoryInitOptions, Signature, Time};

use blog_material_gen::material::{
    BlogIdea, BranchMaterial, DailyBranchData, NotionCategory,
};

pub const DAILY: &str = "daily/2024-01-15";

/// A git repository in a temp directory, built without touching the work tree.
///
/// Every commit gets a timestamp one minute after the previous one so
/// time-sorted walks are deterministic.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
    clock: Cell<i64>,
}

impl TestRepo {
    /// Create an empty repository whose HEAD points at `main`.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).expect("Failed to init git repo");
        Self {
            dir,
            repo,
            clock: Cell::new(1_705_000_000),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'static> {
        let now = self.clock.get() + 60;
        self.clock.set(now);
        Signature::new("Test User", "test@example.com", &Time::new(now, 0))
            .expect("Failed to create signature")
    }

    fn tip(&self, refname: &str) -> Option<Oid> {
        self.repo
            .find_reference(refname)
            .ok()
            .and_then(|r| r.target())
    }

    /// Commit `files` on top of `refname` (created if missing) and move the ref.
    pub fn commit_on(&self, refname: &str, message: &str, files: &[(&str, &str)]) -> Oid {
        let parent = self
            .tip(refname)
            .map(|oid| self.repo.find_commit(oid).expect("Failed to find parent"));
        let base_tree = parent.as_ref().map(|c| c.tree().expect("Failed to read tree"));

        let mut builder = self
            .repo
            .treebuilder(base_tree.as_ref())
            .expect("Failed to create tree builder");
        for (path, content) in files {
            let blob = self.repo.blob(content.as_bytes()).expect("Failed to write blob");
            builder
                .insert(path, blob, FileMode::Blob.into())
                .expect("Failed to insert file");
        }
        let tree_id = builder.write().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let sig = self.signature();
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some(refname), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create a merge commit on `refname` bringing in `other`.
    pub fn merge_on(&self, refname: &str, other: Oid, message: &str) -> Oid {
        let ours = self
            .repo
            .find_commit(self.tip(refname).expect("merge target must exist"))
            .expect("Failed to find merge target");
        let theirs = self.repo.find_commit(other).expect("Failed to find merge source");
        let tree = theirs.tree().expect("Failed to read tree");

        let sig = self.signature();
        self.repo
            .commit(Some(refname), &sig, &sig, message, &tree, &[&ours, &theirs])
            .expect("Failed to create merge commit")
    }

    /// Point `refs/heads/<name>` at `oid`.
    pub fn branch(&self, name: &str, oid: Oid) {
        self.repo
            .reference(&format!("refs/heads/{}", name), oid, true, "test branch")
            .expect("Failed to create branch");
    }

    /// Point `refs/remotes/origin/<name>` at `oid`.
    pub fn remote_branch(&self, name: &str, oid: Oid) {
        self.repo
            .reference(&format!("refs/remotes/origin/{}", name), oid, true, "test remote branch")
            .expect("Failed to create remote branch");
    }

    /// Make `name` the checked-out branch.
    pub fn checkout(&self, name: &str) {
        self.repo
            .set_head(&format!("refs/heads/{}", name))
            .expect("Failed to set HEAD");
    }

    pub fn add_origin(&self, url: &str) {
        self.repo.remote("origin", url).expect("Failed to add remote");
    }
}

/// A daily branch with two merged feature branches.
///
/// Each feature branch carries a `feat`, a `fix` and a `chore` commit
/// touching two files. The local daily branch stays at the fork point; the
/// PR merge commits live on `origin/<daily>` the way they do after a
/// GitHub merge that hasn't been pulled yet.
pub fn daily_fixture() -> TestRepo {
    let t = TestRepo::new();
    let base = t.commit_on("refs/heads/main", "chore: initial commit", &[("README.md", "# app\n")]);
    t.branch(DAILY, base);

    t.branch("feature-search", base);
    t.commit_on(
        "refs/heads/feature-search",
        "feat: add search endpoint",
        &[("search.ts", "export const search = (q: string) => {\n  return [];\n};\n")],
    );
    t.commit_on(
        "refs/heads/feature-search",
        "fix: handle empty query\n\nEmpty strings crashed the tokenizer.",
        &[("search.ts", "export const search = (q: string) => {\n  if (!q) return [];\n  return [];\n};\n")],
    );
    let search_tip = t.commit_on(
        "refs/heads/feature-search",
        "chore: add search helper",
        &[("helpers.py", "def normalize(q):\n    return q.strip()\n")],
    );

    t.branch("feature-login", base);
    t.commit_on(
        "refs/heads/feature-login",
        "feat(auth): add login handler",
        &[("login.rs", "pub fn login() -> bool {\n    true\n}\n")],
    );
    t.commit_on(
        "refs/heads/feature-login",
        "fix(auth): reject expired sessions",
        &[("login.rs", "pub fn login() -> bool {\n    !expired()\n}\n")],
    );
    let login_tip = t.commit_on(
        "refs/heads/feature-login",
        "chore: wire config",
        &[("config.go", "package config\n\nvar Port = 8080\n")],
    );

    let remote_daily = format!("refs/remotes/origin/{}", DAILY);
    t.remote_branch(DAILY, base);
    t.merge_on(
        &remote_daily,
        search_tip,
        &format!("Merge pull request #1 from acme/feature-search into {}", DAILY),
    );
    t.merge_on(
        &remote_daily,
        login_tip,
        &format!("Merge pull request #2 from acme/feature-login into {}", DAILY),
    );

    t
}

/// Material for a page, with `learnings` bullets to control the block count.
pub fn daily_data(learnings: usize) -> DailyBranchData {
    DailyBranchData {
        daily_branch: DAILY.to_string(),
        date: "2024-01-15".to_string(),
        summary: "오늘은 1개의 feature 브랜치에서 3개의 커밋을 통해 2개의 파일을 변경했습니다.".to_string(),
        blog_ideas: vec![BlogIdea {
            title: "typescript에서 add search endpoint".to_string(),
            description: "3개 커밋".to_string(),
            tags: vec!["typescript".to_string()],
            category: NotionCategory::TechBlog,
        }],
        branches: vec![BranchMaterial {
            name: "feature-search".to_string(),
            requirements: String::new(),
            tech: vec![],
            code_blocks: vec![],
            troubleshooting: vec![],
            learnings: (0..learnings).map(|i| format!("learning {}", i)).collect(),
            blog_idea_title: String::new(),
            pr_url: None,
            commit_urls: vec![],
            llm_draft: None,
        }],
        tags: vec!["typescript".to_string()],
        tech: vec!["typescript".to_string()],
        total_commits: 3,
    }
}
