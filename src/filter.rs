use regex::Regex;
use url::Url;

/// Configuration for which "next page" links may be followed
#[derive(Debug, Clone, Default)]
pub struct LinkScopeConfig {
    /// Domain every followed link must be on (if None, any domain is allowed)
    pub required_domain: Option<String>,

    /// Regex patterns for links that are never followed
    pub exclude_patterns: Vec<String>,
}

/// Decides whether a discovered next link stays inside the listing being scraped
#[derive(Debug)]
pub struct LinkScope {
    config: LinkScopeConfig,
    exclude_regexes: Vec<Regex>,
}

impl LinkScope {
    /// Create a new scope from configuration
    pub fn new(config: LinkScopeConfig) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            config,
            exclude_regexes,
        })
    }

    /// Scope pinned to the domain of the start URL
    pub fn for_start(start_url: &Url, exclude_patterns: &[String]) -> Result<Self, regex::Error> {
        Self::new(LinkScopeConfig {
            required_domain: start_url.domain().map(|d| d.to_string()),
            exclude_patterns: exclude_patterns.to_vec(),
        })
    }

    /// Determine if a link may be followed
    pub fn allows(&self, url: &Url) -> bool {
        if !self.is_in_domain_scope(url) {
            return false;
        }

        let url_str = url.as_str();
        !self.exclude_regexes.iter().any(|regex| regex.is_match(url_str))
    }

    fn is_in_domain_scope(&self, url: &Url) -> bool {
        match (&self.config.required_domain, url.domain()) {
            (None, _) => true,
            (Some(required), Some(domain)) => domain == required,
            // No domain in URL but domain required
            (Some(_), None) => false,
        }
    }

    /// Create a normalized version of the URL (e.g., removing fragments)
    pub fn normalize(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }
}
