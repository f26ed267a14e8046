//! Remote tag listing
//!
//! Tags are read with `git ls-remote --tags <url>`, which needs no clone.
//! The [`TagLister`] trait is the seam between discovery and the VCS so that
//! discovery can be exercised without a network.

use crate::error::SatisfyError;
use crate::exec::subprocess::run_command;

/// Prefix of tag references in `ls-remote` output
const TAG_REF_PREFIX: &str = "refs/tags/";

/// Suffix git appends to the peeled commit of an annotated tag
const PEELED_SUFFIX: &str = "^{}";

/// A tag reference reported by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTag {
    /// Tag name without `refs/tags/` and without the peeled marker
    pub name: String,
    /// Commit (or tag object) hash
    pub commit: String,
}

/// Source of remote tags for a repository URL
pub trait TagLister: Send + Sync {
    /// List the tags of a remote repository, in the order the remote reports them
    fn list_remote_tags(&self, url: &str) -> Result<Vec<RemoteTag>, SatisfyError>;
}

/// [`TagLister`] backed by the git command line
#[derive(Debug, Clone)]
pub struct GitCli {
    /// Git executable path
    git_path: String,
}

impl GitCli {
    /// Create a lister that runs the given git executable
    pub fn new(git_path: impl Into<String>) -> Self {
        Self {
            git_path: git_path.into(),
        }
    }
}

impl TagLister for GitCli {
    fn list_remote_tags(&self, url: &str) -> Result<Vec<RemoteTag>, SatisfyError> {
        let result = run_command(&self.git_path, &["ls-remote", "--tags", url])
            .map_err(|e| SatisfyError::vcs_unavailable(url, format!("{:#}", e)))?;

        if !result.success {
            return Err(SatisfyError::vcs_unavailable(
                url,
                format!(
                    "git ls-remote exited with status {}: {}",
                    result.exit_code,
                    result.stderr.trim()
                ),
            ));
        }

        Ok(parse_ls_remote(&result.stdout))
    }
}

/// Parse `ls-remote --tags` output
///
/// Format: `<commit>\trefs/tags/<tagname>[^{}]`. Lines that do not split into
/// exactly two whitespace-separated tokens, and refs outside `refs/tags/`,
/// are ignored.
pub fn parse_ls_remote(output: &str) -> Vec<RemoteTag> {
    let mut tags = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 2 {
            continue;
        }

        let Some(name) = parts[1].strip_prefix(TAG_REF_PREFIX) else {
            continue;
        };
        let name = name.strip_suffix(PEELED_SUFFIX).unwrap_or(name);
        if name.is_empty() {
            continue;
        }

        tags.push(RemoteTag {
            name: name.to_string(),
            commit: parts[0].to_string(),
        });
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ls_remote() {
        let output = "\
1111111111111111111111111111111111111111\trefs/tags/v1.0.0
2222222222222222222222222222222222222222\trefs/tags/v1.1.0-rc.1
3333333333333333333333333333333333333333\trefs/heads/main
";
        let tags = parse_ls_remote(output);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "v1.0.0");
        assert_eq!(tags[0].commit, "1111111111111111111111111111111111111111");
        assert_eq!(tags[1].name, "v1.1.0-rc.1");
    }

    #[test]
    fn test_peeled_annotated_tag_is_stripped() {
        let output = "\
aaaa\trefs/tags/v2.0.0
bbbb\trefs/tags/v2.0.0^{}
";
        let tags = parse_ls_remote(output);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "v2.0.0");
        assert_eq!(tags[1].name, "v2.0.0");
        assert_eq!(tags[1].commit, "bbbb");
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        let output = "\
warning: redirecting to https://example.com/repo.git/
aaaa refs/tags/v1.0.0 extra
bbbb

cccc    refs/tags/v1.2.0
dddd\trefs/tags/
";
        let tags = parse_ls_remote(output);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "v1.2.0");
    }

    #[cfg(unix)]
    #[test]
    fn test_git_cli_failure_is_vcs_unavailable() {
        let lister = GitCli::new("satisfy-no-such-git");
        let err = lister.list_remote_tags("git://example.invalid/x").unwrap_err();
        assert!(matches!(err, SatisfyError::VcsUnavailable { .. }));
    }
}
