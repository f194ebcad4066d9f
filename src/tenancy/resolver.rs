//! Host header → tenant slug resolution.
//!
//! Resolution is driven by an ordered policy table. The first rule whose
//! pattern matches the host decides; a host that does not satisfy the rule
//! (too few labels, `www` prefix, label that is not a valid slug) resolves to
//! the fallback tenant. Nothing here performs I/O and nothing here fails.

use once_cell::sync::Lazy;
use std::net::Ipv4Addr;

use super::slug::TenantSlug;
use crate::config::TenancyConfig;

/// Which hosts a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Host equals the suffix or ends with `.<suffix>`, e.g. `acme.localhost`
    LocalSuffix(String),
    /// Any host (production-style domains)
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRule {
    pub pattern: HostPattern,
    /// Minimum label count for the first label to name a tenant
    pub min_labels: usize,
}

#[derive(Debug, Clone)]
pub struct ResolverPolicy {
    pub rules: Vec<HostRule>,
    pub www_alias: String,
    pub fallback: TenantSlug,
}

impl HostPattern {
    fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::LocalSuffix(suffix) => {
                host == suffix
                    || host
                        .strip_suffix(suffix.as_str())
                        .map(|rest| rest.ends_with('.'))
                        .unwrap_or(false)
            }
            HostPattern::Any => true,
        }
    }
}

impl ResolverPolicy {
    /// `{sub}.<local_suffix>` needs two labels, any other host needs three
    pub fn new(local_suffix: &str, www_alias: &str, fallback: TenantSlug) -> Self {
        Self {
            rules: vec![
                HostRule {
                    pattern: HostPattern::LocalSuffix(local_suffix.to_ascii_lowercase()),
                    min_labels: 2,
                },
                HostRule {
                    pattern: HostPattern::Any,
                    min_labels: 3,
                },
            ],
            www_alias: www_alias.to_ascii_lowercase(),
            fallback,
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Result<Self, super::slug::SlugError> {
        let fallback = TenantSlug::parse(&config.dev_slug)?;
        Ok(Self::new(&config.local_suffix, &config.www_alias, fallback))
    }

    /// Resolve a raw `Host` header value
    pub fn resolve(&self, host: Option<&str>) -> TenantSlug {
        let host = match host.and_then(normalize_host) {
            Some(host) => host,
            None => return self.fallback.clone(),
        };

        let labels: Vec<&str> = host.split('.').collect();
        let rule = match self.rules.iter().find(|rule| rule.pattern.matches(&host)) {
            Some(rule) => rule,
            None => return self.fallback.clone(),
        };

        if labels.len() < rule.min_labels {
            return self.fallback.clone();
        }

        let first = labels[0];
        if first == self.www_alias {
            return self.fallback.clone();
        }

        TenantSlug::parse(first).unwrap_or_else(|_| self.fallback.clone())
    }
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        let config = TenancyConfig::default();
        Self::new(
            &config.local_suffix,
            &config.www_alias,
            TenantSlug::dev(),
        )
    }
}

static DEFAULT_POLICY: Lazy<ResolverPolicy> = Lazy::new(ResolverPolicy::default);

/// Resolve with the default policy
pub fn resolve(host: Option<&str>) -> TenantSlug {
    DEFAULT_POLICY.resolve(host)
}

/// Lowercased host without port or trailing dot. `None` for empty hosts and
/// IP literals.
fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('[') {
        return None;
    }

    let without_port = match raw.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return None,
        None => raw,
    };

    let host = without_port.strip_suffix('.').unwrap_or(without_port);
    if host.is_empty() || host.parse::<Ipv4Addr>().is_ok() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}
