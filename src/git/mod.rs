//! Git operations using git2-rs.

pub mod branches;
pub mod commits;
pub mod diff;
pub mod range;

pub use branches::{
    branch_exists, current_branch, fetch_origin, find_base_branch, get_merged_branches,
    get_recent_daily_branches, list_branches,
};
pub use commits::{CommitInfo, CommitType, commits_for_branch, parse_conventional_commit};
pub use diff::{FileChange, detect_language, files_changed, truncate_diff};
pub use range::{merge_base, resolve_range};
