//! Error types and helpers for user-friendly error messages
//!
//! Every failure that aborts a run ends up here: configuration problems are
//! detected before any remote query, tag format and empty-tag failures abort
//! the run before anything is written.

use thiserror::Error;

/// Custom error types with helpful context and suggestions
#[derive(Error, Debug)]
pub enum SatisfyError {
    /// Package list or manifest could not be read, parsed or validated
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },

    /// A tag matched none of the patterns declared for its package
    #[error("Tag '{tag}' doesn't match pattern '{pattern}'")]
    TagFormat { tag: String, pattern: String },

    /// A package produced no usable version
    #[error("No tags found for {package} ({url})")]
    NoTagsFound {
        package: String,
        url: String,
        hint: String,
    },

    /// The VCS command could not list remote tags
    #[error("Cannot list tags of {url}: {message}")]
    VcsUnavailable { url: String, message: String },
}

impl SatisfyError {
    /// Create a configuration error with source and hint
    pub fn config_error_with_hint(
        message: impl Into<String>,
        source: Option<anyhow::Error>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source,
            hint: Some(hint.into()),
        }
    }

    /// Create a tag format error for the last pattern that was tried
    pub fn tag_format(tag: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::TagFormat {
            tag: tag.into(),
            pattern: pattern.into(),
        }
    }

    /// Create a "no tags found" error for a package
    pub fn no_tags_found(package: impl Into<String>, url: impl Into<String>) -> Self {
        Self::NoTagsFound {
            package: package.into(),
            url: url.into(),
            hint: hints::no_tags_found().to_string(),
        }
    }

    /// Create a VCS failure
    pub fn vcs_unavailable(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VcsUnavailable {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        match self {
            SatisfyError::Config { hint, source, .. } => {
                if let Some(src) = source {
                    eprintln!("\n{} {:#}", style("CAUSE:").cyan().bold(), src);
                }
                if let Some(h) = hint {
                    eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
                }
            }
            SatisfyError::NoTagsFound { hint, .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
            SatisfyError::TagFormat { .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hints::tag_regexp());
            }
            SatisfyError::VcsUnavailable { .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hints::git());
            }
        }

        eprintln!();
    }
}

/// Helper trait for turning I/O and parse failures into configuration errors
pub trait ResultExt<T> {
    /// Add context with a hint
    fn context_with_hint(
        self,
        context: impl Into<String>,
        hint: impl Into<String>,
    ) -> Result<T, SatisfyError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context_with_hint(
        self,
        context: impl Into<String>,
        hint: impl Into<String>,
    ) -> Result<T, SatisfyError> {
        self.map_err(|e| {
            SatisfyError::config_error_with_hint(
                format!("{}: {}", context.into(), e),
                Some(e.into()),
                hint,
            )
        })
    }
}

/// Common error hints
pub mod hints {
    /// Get hint for missing Git
    pub fn git() -> &'static str {
        "Install Git from https://git-scm.com/ or use your package manager:\n\
         • macOS: brew install git\n\
         • Ubuntu: sudo apt install git\n\
         • Windows: winget install Git.Git\n\
         \n\
         Or point --git (SATISFY_GIT) at the executable to use."
    }

    /// Get hint for an invalid package list
    pub fn package_list() -> &'static str {
        "The package list must be a JSON object keyed by package name:\n\
         {\n\
         \x20   \"vendor/name\": {\n\
         \x20       \"url\": \"https://example.com/vendor/name.git\",\n\
         \x20       \"minversion\": \"1.0\",\n\
         \x20       \"tag-regexp\": [\"^release-(?P<major>\\\\d+)\\\\.(?P<minor>\\\\d+)$\"],\n\
         \x20       \"defaults\": { \"homepage\": \"https://example.com\" }\n\
         \x20   }\n\
         }"
    }

    /// Get hint for an invalid base manifest
    pub fn manifest() -> &'static str {
        "The base manifest must be a satis repository definition with a\n\
         \"repositories\" member, even if it is empty:\n\
         { \"name\": \"my/repo\", \"repositories\": [] }"
    }

    /// Get hint for tag pattern mismatches
    pub fn tag_regexp() -> &'static str {
        "Every tag of a repository with \"tag-regexp\" must match one of its patterns.\n\
         Add a pattern for the unexpected tag, or check the named groups\n\
         (major, minor, patch, maturity, maturity_dev, maturity_alpha,\n\
         maturity_beta, maturity_RC, build)."
    }

    /// Get hint for packages without usable tags
    pub fn no_tags_found() -> &'static str {
        "The repository has no tag that looks like a release. Check that:\n\
         • the url is reachable (try: git ls-remote --tags <url>)\n\
         • tags follow v1.2.3 / 1.2.3-rc.1, or declare \"tag-regexp\"\n\
         • the repository has not been renamed or moved"
    }
}
