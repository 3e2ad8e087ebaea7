use crate::commands::Ctx;
use berth::version::{HttpVersionChecker, ImageVersionInfo, VersionChecker, VersionInfo};
use berth::{Config, Reporter};

/// Everything `berth version` reports, in one serializable document for
/// the `--json` mode.
#[derive(serde::Serialize)]
struct VersionReport {
    version: String,
    image_tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cli: Option<VersionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<ImageVersionInfo>>,
}

pub(crate) async fn cmd_version(ctx: Ctx, json: bool) -> anyhow::Result<()> {
    let checker = HttpVersionChecker::new()?;
    let report = collect(&ctx.config, &checker, &ctx.console).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("berth {}", report.version);
    println!("image tag: {}", report.image_tag);

    if let Some(cli) = &report.cli {
        if cli.needs_update {
            ctx.console.warn(&format!(
                "CLI update available: {} -> {}",
                cli.current, cli.latest
            ));
            ctx.console.info(&format!("Download: {}", cli.update_url));
        } else {
            ctx.console.success("CLI is up to date");
        }
    }

    if let Some(images) = &report.images {
        for image in images.iter().filter(|i| i.needs_update) {
            ctx.console.warn(&format!(
                "{} update available: {} -> {}",
                image.image, image.current, image.latest
            ));
        }
        if images.iter().all(|i| !i.needs_update) {
            ctx.console.success("Images are up to date");
        }
    }

    Ok(())
}

/// Run both checks, downgrading network failures to warnings so `version`
/// always reports at least the local build info.
async fn collect(
    config: &Config,
    checker: &dyn VersionChecker,
    console: &dyn Reporter,
) -> VersionReport {
    let cli = match checker.check_cli(&config.version).await {
        Ok(info) => Some(info),
        Err(e) => {
            console.warn(&format!("Could not check latest release: {e}"));
            None
        }
    };

    let images = match checker.check_images(&config.image_tag).await {
        Ok(images) => Some(images),
        Err(e) => {
            console.warn(&format!("Could not check image versions: {e}"));
            None
        }
    };

    VersionReport {
        version: config.version.clone(),
        image_tag: config.image_tag.clone(),
        cli,
        images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth::{BerthError, Console, Paths, Result};
    use std::path::PathBuf;

    struct FixedChecker {
        latest: String,
    }

    #[async_trait::async_trait]
    impl VersionChecker for FixedChecker {
        async fn check_cli(&self, current: &str) -> Result<VersionInfo> {
            Ok(VersionInfo {
                current: current.to_string(),
                latest: self.latest.clone(),
                update_url: "https://example.com/releases/latest".to_string(),
                needs_update: current != self.latest,
            })
        }

        async fn check_images(&self, current_tag: &str) -> Result<Vec<ImageVersionInfo>> {
            Ok(vec![ImageVersionInfo {
                image: "backend".to_string(),
                current: current_tag.to_string(),
                latest: self.latest.clone(),
                needs_update: current_tag != self.latest,
            }])
        }
    }

    struct DownChecker;

    #[async_trait::async_trait]
    impl VersionChecker for DownChecker {
        async fn check_cli(&self, _current: &str) -> Result<VersionInfo> {
            Err(BerthError::Other("network unreachable".to_string()))
        }

        async fn check_images(&self, _current_tag: &str) -> Result<Vec<ImageVersionInfo>> {
            Err(BerthError::Other("network unreachable".to_string()))
        }
    }

    fn cfg() -> Config {
        let paths = Paths::new(Some(PathBuf::from("/tmp/c")), Some(PathBuf::from("/tmp/d")));
        Config::defaults(&paths)
    }

    #[tokio::test]
    async fn report_carries_release_pointer_when_outdated() {
        let config = cfg();
        let checker = FixedChecker {
            latest: "9.9.9".to_string(),
        };

        let report = collect(&config, &checker, &Console::silent()).await;

        let cli = report.cli.unwrap();
        assert!(cli.needs_update);
        assert_eq!(cli.update_url, "https://example.com/releases/latest");
        assert!(report.images.unwrap().iter().all(|i| i.needs_update));
    }

    #[tokio::test]
    async fn network_failure_still_reports_build_info() {
        let config = cfg();
        let report = collect(&config, &DownChecker, &Console::silent()).await;

        assert_eq!(report.version, config.version);
        assert!(report.cli.is_none());
        assert!(report.images.is_none());

        // The JSON document omits the unavailable sections entirely.
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("cli").is_none());
        assert_eq!(json["image_tag"], config.image_tag);
    }
}
