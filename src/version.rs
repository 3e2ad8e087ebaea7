//! Remote version checks against the GitHub releases API and the image
//! registry tag listing.

use crate::error::{BerthError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const RELEASES_URL: &str = "https://api.github.com/repos/berth-sh/berth/releases/latest";
const REGISTRY_TAGS_URL: &str = "https://hub.docker.com/v2/repositories/berth/backend/tags";
const USER_AGENT: &str = concat!("berth-cli/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Images whose tags track the config's `image_tag`.
const TRACKED_IMAGES: &[&str] = &["backend", "frontend"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub current: String,
    pub latest: String,
    pub update_url: String,
    pub needs_update: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageVersionInfo {
    pub image: String,
    pub current: String,
    pub latest: String,
    pub needs_update: bool,
}

#[async_trait]
pub trait VersionChecker: Send + Sync {
    async fn check_cli(&self, current: &str) -> Result<VersionInfo>;
    async fn check_images(&self, current_tag: &str) -> Result<Vec<ImageVersionInfo>>;
}

/// `true` when the versions differ after stripping a leading `v`.
/// Dev builds always want an update.
pub fn versions_differ(current: &str, latest: &str) -> bool {
    let current = current.trim_start_matches('v');
    let latest = latest.trim_start_matches('v');
    current == "dev" || current != latest
}

#[derive(Deserialize)]
struct ReleaseInfo {
    tag_name: String,
    html_url: String,
}

#[derive(Deserialize)]
struct TagPage {
    results: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

pub struct HttpVersionChecker {
    client: reqwest::Client,
    releases_url: String,
    registry_tags_url: String,
}

impl HttpVersionChecker {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            releases_url: RELEASES_URL.to_string(),
            registry_tags_url: REGISTRY_TAGS_URL.to_string(),
        })
    }

    async fn latest_release(&self) -> Result<ReleaseInfo> {
        let response = self.client.get(&self.releases_url).send().await?;
        if !response.status().is_success() {
            return Err(BerthError::Other(format!(
                "GitHub API returned status {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    /// Newest non-`latest` tag from the registry listing; the registry
    /// returns tags newest-first.
    async fn latest_image_tag(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.registry_tags_url)
            .query(&[("page_size", "25")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BerthError::Other(format!(
                "registry returned status {}",
                response.status()
            )));
        }
        let page: TagPage = response.json().await?;
        page.results
            .into_iter()
            .map(|t| t.name)
            .find(|name| name != "latest")
            .ok_or_else(|| BerthError::Other("no image tags published".to_string()))
    }
}

#[async_trait]
impl VersionChecker for HttpVersionChecker {
    async fn check_cli(&self, current: &str) -> Result<VersionInfo> {
        let release = self.latest_release().await?;
        Ok(VersionInfo {
            current: current.to_string(),
            needs_update: versions_differ(current, &release.tag_name),
            latest: release.tag_name,
            update_url: release.html_url,
        })
    }

    async fn check_images(&self, current_tag: &str) -> Result<Vec<ImageVersionInfo>> {
        let latest = self.latest_image_tag().await?;
        Ok(TRACKED_IMAGES
            .iter()
            .map(|image| ImageVersionInfo {
                image: (*image).to_string(),
                current: current_tag.to_string(),
                latest: latest.clone(),
                needs_update: versions_differ(current_tag, &latest),
            })
            .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_comparison_strips_v_prefix() {
        assert!(!versions_differ("v1.2.3", "1.2.3"));
        assert!(!versions_differ("1.2.3", "v1.2.3"));
        assert!(versions_differ("1.2.3", "1.2.4"));
    }

    #[test]
    fn dev_builds_always_need_update() {
        assert!(versions_differ("dev", "dev"));
        assert!(versions_differ("dev", "1.0.0"));
    }
}
