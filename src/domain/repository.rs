use crate::error::{Result, TagTrooperError};
use std::fmt;

/// The only hosting platform tagtrooper talks to.
pub const GITHUB_HOST: &str = "github.com";

const SCHEME_PREFIXES: [&str; 3] = ["https://", "http://", "git://"];

/// Owner/name pair identifying a repository on GitHub
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    pub owner: String,
    pub name: String,
}

impl RepositoryReference {
    /// Create a reference from its parts
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepositoryReference {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `[https://|http://|git://]github.com/owner/repo[.git][/...]`
    ///
    /// Segments after the repository name are ignored, so links to issues or
    /// trees of a repository resolve to the repository itself.
    pub fn parse(url: &str) -> Result<Self> {
        let without_scheme = SCHEME_PREFIXES
            .iter()
            .find_map(|prefix| url.strip_prefix(prefix))
            .unwrap_or(url);

        let path = without_scheme
            .strip_prefix(GITHUB_HOST)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                TagTrooperError::invalid_url(format!("'{}' is not a {} URL", url, GITHUB_HOST))
            })?;

        let mut segments = path.split('/');
        let owner = segments.next().unwrap_or_default();
        let name = segments
            .next()
            .map(|segment| segment.strip_suffix(".git").unwrap_or(segment))
            .ok_or_else(|| {
                TagTrooperError::invalid_url(format!(
                    "'{}' needs both an owner and a repository name",
                    url
                ))
            })?;

        if owner.is_empty() || name.is_empty() {
            return Err(TagTrooperError::invalid_url(format!(
                "'{}' has an empty owner or repository name",
                url
            )));
        }

        Ok(RepositoryReference::new(owner, name))
    }

    /// HTTPS clone URL for this repository
    pub fn clone_url(&self) -> String {
        format!("https://{}/{}/{}.git", GITHUB_HOST, self.owner, self.name)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_with_git_suffix() {
        let reference = RepositoryReference::parse("https://github.com/acme/widgets.git").unwrap();
        assert_eq!(reference, RepositoryReference::new("acme", "widgets"));
    }

    #[test]
    fn test_parse_git_scheme_with_trailing_path() {
        let reference = RepositoryReference::parse("git://github.com/acme/widgets/issues").unwrap();
        assert_eq!(reference.owner, "acme");
        assert_eq!(reference.name, "widgets");
    }

    #[test]
    fn test_parse_plain_http_and_schemeless() {
        assert_eq!(
            RepositoryReference::parse("http://github.com/acme/widgets").unwrap(),
            RepositoryReference::new("acme", "widgets")
        );
        assert_eq!(
            RepositoryReference::parse("github.com/acme/widgets").unwrap(),
            RepositoryReference::new("acme", "widgets")
        );
    }

    #[test]
    fn test_parse_rejects_other_host() {
        let err = RepositoryReference::parse("https://other-host/acme/widgets").unwrap_err();
        assert!(matches!(err, TagTrooperError::InvalidUrl(_)));
    }

    #[test]
    fn test_parse_rejects_lookalike_host() {
        let err = RepositoryReference::parse("https://github.company.com/acme/widgets");
        assert!(err.is_err());
    }

    #[test]
    fn test_parse_rejects_single_segment() {
        let err = RepositoryReference::parse("https://github.com/acme").unwrap_err();
        assert!(matches!(err, TagTrooperError::InvalidUrl(_)));
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(RepositoryReference::parse("https://github.com//widgets").is_err());
        assert!(RepositoryReference::parse("https://github.com/acme/").is_err());
        assert!(RepositoryReference::parse("https://github.com/acme/.git").is_err());
    }

    #[test]
    fn test_display_and_clone_url() {
        let reference = RepositoryReference::new("acme", "widgets");
        assert_eq!(reference.to_string(), "acme/widgets");
        assert_eq!(reference.clone_url(), "https://github.com/acme/widgets.git");
    }
}
