//! Profile record as returned by the GitHub `users/{login}` endpoint

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{Error, Result};

/// Public fields describing one GitHub account.
///
/// Field names follow the upstream JSON; anything else in the payload is
/// ignored. Optional text fields that are empty or whitespace-only are
/// treated as absent by the accessors below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfileRecord {
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub blog: Option<String>,
    #[serde(default)]
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub public_gists: u64,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ProfileRecord {
    /// Decode a profile from a JSON body and check the record invariants.
    pub fn from_json(body: &str) -> Result<Self> {
        let record: ProfileRecord =
            serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;
        if record.login.trim().is_empty() {
            return Err(Error::Decode("profile has an empty login".into()));
        }
        Ok(record)
    }

    /// Name shown on the card, falling back to the login
    pub fn display_name(&self) -> &str {
        present(&self.name).unwrap_or(&self.login)
    }

    pub fn bio(&self) -> Option<&str> {
        present(&self.bio)
    }

    pub fn company(&self) -> Option<&str> {
        present(&self.company)
    }

    pub fn location(&self) -> Option<&str> {
        present(&self.location)
    }

    pub fn blog(&self) -> Option<&str> {
        present(&self.blog)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// `Jan 1, 2015` style join date; the raw string when it does not parse
    pub fn joined_display(&self) -> String {
        match self.created_at() {
            Some(d) => d.format("%b %-d, %Y").to_string(),
            None => self.created_at.clone(),
        }
    }

    /// Public profile page, derived from the login when the payload lacks it
    pub fn profile_url(&self) -> String {
        present(&self.html_url)
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://github.com/{}", self.login))
    }
}

/// Plain-text rendition of a card, one field per line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSummary {
    pub lines: Vec<String>,
}

impl TextSummary {
    pub fn from_profile(p: &ProfileRecord) -> Self {
        let mut lines = vec![p.display_name().to_string(), format!("@{}", p.login)];
        if let Some(bio) = p.bio() {
            lines.push(bio.to_string());
        }
        if let Some(company) = p.company() {
            lines.push(format!("Company: {}", company));
        }
        if let Some(location) = p.location() {
            lines.push(format!("Location: {}", location));
        }
        if let Some(blog) = p.blog() {
            lines.push(format!("Blog: {}", blog));
        }
        if let Some(tw) = present(&p.twitter_username) {
            lines.push(format!("Twitter: @{}", tw));
        }
        lines.push(format!(
            "Repositories: {}  Followers: {}  Following: {}  Gists: {}",
            p.public_repos, p.followers, p.following, p.public_gists
        ));
        lines.push(format!("Joined {}", p.joined_display()));
        lines.push(p.profile_url());
        Self { lines }
    }
}

impl std::fmt::Display for TextSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> ProfileRecord {
    ProfileRecord {
        login: "octocat".into(),
        id: 583231,
        name: Some("The Octocat".into()),
        avatar_url: "https://avatars.githubusercontent.com/u/583231?v=4".into(),
        bio: None,
        company: Some("@github".into()),
        location: Some("San Francisco".into()),
        public_repos: 8,
        followers: 9000,
        following: 9,
        created_at: "2011-01-25T18:44:36Z".into(),
        html_url: Some("https://github.com/octocat".into()),
        blog: Some("https://github.blog".into()),
        twitter_username: None,
        public_gists: 8,
        account_type: Some("User".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_upstream_shape_and_ignores_extra_fields() {
        let body = r#"{
            "login": "octocat", "id": 1, "name": null, "avatar_url": "https://a/b.png",
            "bio": "", "company": null, "location": "Earth",
            "public_repos": 2, "followers": 3, "following": 4,
            "created_at": "2015-01-01T00:00:00Z", "site_admin": false, "type": "User"
        }"#;
        let p = ProfileRecord::from_json(body).unwrap();
        assert_eq!(p.display_name(), "octocat");
        assert_eq!(p.bio(), None);
        assert_eq!(p.location(), Some("Earth"));
        assert_eq!(p.account_type.as_deref(), Some("User"));
        assert_eq!(p.joined_display(), "Jan 1, 2015");
    }

    #[test]
    fn empty_login_is_rejected() {
        let body = r#"{"login": "", "public_repos": 0, "followers": 0, "following": 0}"#;
        assert!(matches!(ProfileRecord::from_json(body), Err(Error::Decode(_))));
    }

    #[test]
    fn missing_metrics_are_rejected() {
        let body = r#"{"login": "x"}"#;
        assert!(ProfileRecord::from_json(body).is_err());
    }

    #[test]
    fn unparseable_date_is_shown_raw() {
        let mut p = sample_profile();
        p.created_at = "sometime".into();
        assert_eq!(p.joined_display(), "sometime");
    }

    #[test]
    fn text_summary_skips_absent_fields() {
        let mut p = sample_profile();
        p.company = None;
        let s = TextSummary::from_profile(&p);
        assert_eq!(s.lines[0], "The Octocat");
        assert!(!s.lines.iter().any(|l| l.starts_with("Company:")));
        assert!(s.lines.iter().any(|l| l == "Location: San Francisco"));
        assert!(s.to_string().contains("Joined Jan 25, 2011"));
    }
}
