//! Reference and commit range resolution.

use git2::{Oid, Repository};

use crate::error::GitError;

/// Resolved commit range with start and end OIDs.
#[derive(Debug, Clone)]
pub struct CommitRange {
    pub from: Oid,
    pub to: Oid,
    pub from_ref: String,
    pub to_ref: String,
}

/// Resolve `from..to` where both ends are branch names, tags or hashes.
pub fn resolve_range(repo: &Repository, from: &str, to: &str) -> Result<CommitRange, GitError> {
    Ok(CommitRange {
        from: resolve_reference(repo, from)?,
        to: resolve_reference(repo, to)?,
        from_ref: from.to_string(),
        to_ref: to.to_string(),
    })
}

/// Resolve a reference (branch, remote branch, tag, commit hash) to a commit OID.
pub fn resolve_reference(repo: &Repository, reference: &str) -> Result<Oid, GitError> {
    // Try as a direct OID first
    if let Ok(oid) = Oid::from_str(reference)
        && repo.find_commit(oid).is_ok()
    {
        return Ok(oid);
    }

    match repo.revparse_single(reference) {
        Ok(obj) => Ok(obj.peel_to_commit().map_err(GitError::ParseCommit)?.id()),
        Err(e) => Err(GitError::ReferenceNotFound(reference.to_string(), e)),
    }
}

/// Nearest common ancestor of two references.
pub fn merge_base(repo: &Repository, current: &str, base: &str) -> Result<Oid, GitError> {
    let wrap = |source: git2::Error| GitError::MergeBase {
        current: current.to_string(),
        base: base.to_string(),
        source,
    };

    let current_oid = resolve_reference(repo, current)?;
    let base_oid = resolve_reference(repo, base)?;
    repo.merge_base(current_oid, base_oid).map_err(wrap)
}
