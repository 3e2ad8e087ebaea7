//! Rendering of the docker-compose artifact from a [`Config`].
//!
//! The compose file is derived state: regenerated on install, on upgrade,
//! and whenever `up` runs against a changed config.

use crate::config::Config;
use crate::error::Result;
use std::fmt::Write as _;
use std::path::Path;

/// Render the compose document for the current config. Optional services
/// (deep research, proxy agent) are emitted only when their toggle is set;
/// the inference engine runs outside compose and never appears here.
pub fn render_compose(config: &Config) -> String {
    let mut out = String::new();
    let tag = &config.image_tag;
    let data_dir = config.data_dir.display();

    out.push_str("services:\n");

    let _ = write!(
        out,
        "  backend:
    image: berth/backend:{tag}
    restart: unless-stopped
    environment:
      LLM_BASE_URL: \"{llm}\"
      DEFAULT_MODEL: \"{model}\"
    volumes:
      - {data_dir}:/app/data
    expose:
      - \"8000\"
",
        llm = config.llm_base_url,
        model = config.default_model,
    );

    let _ = write!(
        out,
        "  frontend:
    image: berth/frontend:{tag}
    restart: unless-stopped
    ports:
      - \"{port}:3000\"
    depends_on:
      - backend
",
        port = config.port,
    );

    if config.enable_deep_research {
        let _ = write!(
            out,
            "  deep-research:
    image: berth/deep-research:{tag}
    restart: unless-stopped
    depends_on:
      - backend
"
        );
    }

    if config.enable_proxy_agent {
        let _ = write!(
            out,
            "  proxy-agent:
    image: berth/proxy-agent:{tag}
    restart: unless-stopped
    environment:
      PROXY_SERVER_URL: \"{proxy}\"
",
            proxy = config.proxy_server_url,
        );
    }

    out
}

pub fn write_compose(config: &Config, output: &Path) -> Result<()> {
    std::fs::write(output, render_compose(config))?;
    Ok(())
}
