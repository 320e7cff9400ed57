use super::Scorer;
use crate::filter::LinkContext;
use crate::url::{extract_domain, matches_wildcard};
use chrono::Datelike;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Prefers URLs whose path depth is close to an optimum
///
/// `score = weight / (1 + |segments - optimal|)`
#[derive(Debug, Clone)]
pub struct PathDepthScorer {
    optimal_depth: usize,
    weight: f64,
}

impl PathDepthScorer {
    pub fn new(optimal_depth: usize, weight: f64) -> Self {
        Self {
            optimal_depth,
            weight,
        }
    }
}

impl Scorer for PathDepthScorer {
    fn name(&self) -> &str {
        "path-depth"
    }

    fn score(&self, url: &Url, _ctx: &LinkContext) -> f64 {
        let depth = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).count())
            .unwrap_or(0);
        let distance = depth.abs_diff(self.optimal_depth) as f64;
        (self.weight / (1.0 + distance)).clamp(0.0, 1.0)
    }
}

/// Decay table indexed by age in years; older or undated URLs get the last entry
const FRESHNESS_BY_AGE: [f64; 6] = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5];

/// Four-digit years 1900-2099 not embedded in a longer number
///
/// `None` if the pattern fails to compile, in which case every URL is undated.
fn year_regex() -> Option<&'static Regex> {
    static YEAR: OnceLock<Option<Regex>> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").ok()).as_ref()
}

/// Prefers URLs that mention a recent year
#[derive(Debug, Clone)]
pub struct FreshnessScorer {
    weight: f64,
    current_year: i32,
}

impl FreshnessScorer {
    pub fn new(weight: f64) -> Self {
        Self::with_current_year(weight, chrono::Utc::now().year())
    }

    /// Pins the reference year
    pub fn with_current_year(weight: f64, current_year: i32) -> Self {
        Self {
            weight,
            current_year,
        }
    }

    fn most_recent_year(&self, url: &Url) -> Option<i32> {
        let regex = year_regex()?;
        let path = url.path();
        let mut latest = None;
        // Matches overlap on the shared delimiter, so walk by position.
        let mut start = 0;
        while let Some(caps) = regex.captures_at(path, start) {
            let Some(m) = caps.get(1) else { break };
            if let Ok(year) = m.as_str().parse::<i32>() {
                if year <= self.current_year {
                    latest = latest.max(Some(year));
                }
            }
            start = m.end();
        }
        latest
    }
}

impl Scorer for FreshnessScorer {
    fn name(&self) -> &str {
        "freshness"
    }

    fn score(&self, url: &Url, _ctx: &LinkContext) -> f64 {
        let base = match self.most_recent_year(url) {
            Some(year) => {
                let age = (self.current_year - year) as usize;
                FRESHNESS_BY_AGE[age.min(FRESHNESS_BY_AGE.len() - 1)]
            }
            None => FRESHNESS_BY_AGE[FRESHNESS_BY_AGE.len() - 1],
        };
        (base * self.weight).clamp(0.0, 1.0)
    }
}

/// Scores URLs by a configured per-domain authority
///
/// Domains use the wildcard syntax of the domain filter; the first matching
/// entry wins. Unlisted domains get `default_authority`.
#[derive(Debug, Clone)]
pub struct DomainAuthorityScorer {
    authorities: Vec<(String, f64)>,
    default_authority: f64,
    weight: f64,
}

impl DomainAuthorityScorer {
    pub fn new(authorities: Vec<(String, f64)>, weight: f64) -> Self {
        Self {
            authorities: authorities
                .into_iter()
                .map(|(d, a)| (d.to_lowercase(), a))
                .collect(),
            default_authority: 0.5,
            weight,
        }
    }

    pub fn with_default_authority(mut self, authority: f64) -> Self {
        self.default_authority = authority;
        self
    }
}

impl Scorer for DomainAuthorityScorer {
    fn name(&self) -> &str {
        "domain-authority"
    }

    fn score(&self, url: &Url, _ctx: &LinkContext) -> f64 {
        let authority = extract_domain(url)
            .and_then(|domain| {
                self.authorities
                    .iter()
                    .find(|(pattern, _)| matches_wildcard(pattern, &domain))
                    .map(|(_, a)| *a)
            })
            .unwrap_or(self.default_authority);
        (authority * self.weight).clamp(0.0, 1.0)
    }
}
