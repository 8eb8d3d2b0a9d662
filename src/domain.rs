use std::fmt;
use url::Url;

use crate::error::Auth0Error;

const MANAGEMENT_API_PATH: &str = "api/v2/";

/// Validated tenant domain, such as `tenant.us.auth0.com`.
///
/// Domains without a scheme are served over `https`. The base URL always ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    base_url: Url,
}

impl TryFrom<&str> for Domain {
    type Error = Auth0Error;

    fn try_from(domain: &str) -> Result<Self, Self::Error> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(Auth0Error::Configuration("domain must not be empty".into()));
        }
        let with_scheme = if domain.starts_with("https://") || domain.starts_with("http://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        };
        let mut base_url = Url::parse(&with_scheme).map_err(|err| {
            Auth0Error::Configuration(format!("the domain `{domain}` had an invalid format: {err}"))
        })?;
        if base_url.host_str().is_none_or(str::is_empty) {
            return Err(Auth0Error::Configuration(format!(
                "the domain `{domain}` had an invalid format"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);
        Ok(Self { base_url })
    }
}

impl Domain {
    /// `https://<domain>/`
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Identifier of the Management API, used as audience of its access tokens.
    pub fn management_audience(&self) -> String {
        format!("{}{MANAGEMENT_API_PATH}", self.base_url)
    }

    /// Base URL of the Management API.
    pub(crate) fn management_url(&self) -> Result<Url, Auth0Error> {
        self.base_url
            .join(MANAGEMENT_API_PATH)
            .map_err(|err| Auth0Error::Configuration(err.to_string()))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case::plain("tenant.auth0.com", "https://tenant.auth0.com/")]
    #[case::trailing_slash("tenant.auth0.com/", "https://tenant.auth0.com/")]
    #[case::https("https://tenant.auth0.com", "https://tenant.auth0.com/")]
    #[case::http("http://localhost:8080", "http://localhost:8080/")]
    #[case::with_path("https://proxy.example.com/auth0", "https://proxy.example.com/auth0/")]
    fn builds_the_base_url(#[case] domain: &str, #[case] expected: &str) {
        let domain = Domain::try_from(domain).unwrap();

        assert_eq!(domain.base_url().as_str(), expected);
        assert_eq!(domain.management_audience(), format!("{expected}api/v2/"));
        assert_eq!(
            domain.management_url().unwrap().as_str(),
            format!("{expected}api/v2/")
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::invalid_host("not a domain")]
    #[case::missing_host("https://")]
    fn rejects_invalid_domains(#[case] domain: &str) {
        assert_matches!(Domain::try_from(domain), Err(Auth0Error::Configuration(_)));
    }
}
