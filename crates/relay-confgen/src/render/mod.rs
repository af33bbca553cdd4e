//! Output renderings of a built [`AgentConfig`].
//!
//! Four textual artifacts are derived from the same config:
//! - pretty-printed configuration JSON (the downloadable file),
//! - a shell script exporting the equivalent environment variables,
//! - an MCP launcher snippet invoking the agent binary,
//! - an MCP launcher snippet running the container image.
//!
//! All four are recomputed together; none is patched incrementally.

pub mod env_script;
pub mod launchers;

use crate::model::AgentConfig;

/// All renderings of one config, produced atomically by [`render`].
#[derive(Debug, Clone)]
pub struct Rendered {
    pub config_json: String,
    pub env_script: String,
    pub binary_launcher: String,
    pub container_launcher: String,
    pub file_name: String,
}

pub fn render(config: &AgentConfig) -> serde_json::Result<Rendered> {
    Ok(Rendered {
        config_json: serde_json::to_string_pretty(config)?,
        env_script: env_script::render(config),
        binary_launcher: launchers::binary_launcher(config)?,
        container_launcher: launchers::container_launcher(config)?,
        file_name: download_file_name(config),
    })
}

/// Suggested file name for the downloadable config JSON.
pub fn download_file_name(config: &AgentConfig) -> String {
    format!("{}-config.json", config.agent.name)
}
