//! MCP-client launcher snippets.
//!
//! Both snippets nest the agent under `mcpServers` keyed by the binary
//! name, ready to paste into a client's server registry. The binary
//! variant passes settings through an `environment` object; the container
//! variant inlines them as `docker run -e` flags. Neither embeds the real
//! API key.

use serde_json::json;

use crate::model::AgentConfig;

pub const AGENT_BINARY: &str = "relay-agent";
pub const CONTAINER_IMAGE: &str = "ghcr.io/relay-mcp/relay-agent:latest";
pub const API_KEY_PLACEHOLDER: &str = "...YOUR_LLM_API_KEY...";

/// Launcher that runs the locally installed agent binary.
pub fn binary_launcher(config: &AgentConfig) -> serde_json::Result<String> {
    let agent = &config.agent;
    let mut environment = serde_json::Map::new();
    let pairs = [
        ("AGENT_NAME", json!(agent.name)),
        ("AGENT_VERSION", json!(agent.version)),
        ("TOOL_NAME", json!(agent.tool.name)),
        ("TOOL_DESCRIPTION", json!(agent.tool.description)),
        ("TOOL_ARGUMENT_NAME", json!(agent.tool.argument_name)),
        (
            "TOOL_ARGUMENT_DESCRIPTION",
            json!(agent.tool.argument_description),
        ),
        ("LLM_PROVIDER", json!(agent.llm.provider)),
        ("LLM_API_KEY", json!(API_KEY_PLACEHOLDER)),
        ("LLM_MODEL", json!(agent.llm.model)),
        ("LLM_MAX_TOKENS", json!(agent.llm.max_tokens)),
        ("LLM_TEMPERATURE", json!(agent.llm.temperature)),
        ("RUNTIME_LOG_LEVEL", json!(config.runtime.log.level)),
    ];
    for (key, value) in pairs {
        environment.insert(key.to_string(), value);
    }

    let entry = json!({
        "command": AGENT_BINARY,
        "args": [],
        "environment": environment,
    });
    to_pretty_4(&wrap(entry))
}

/// Launcher that runs the published container image. The API key is
/// referenced from the caller's shell, never embedded.
pub fn container_launcher(config: &AgentConfig) -> serde_json::Result<String> {
    let agent = &config.agent;
    let mut args: Vec<String> = vec!["run".to_string(), "-i".to_string(), "--rm".to_string()];
    env_pair(&mut args, "AGENT_NAME", &agent.name);
    env_pair(&mut args, "AGENT_VERSION", &agent.version);
    env_pair(&mut args, "TOOL_NAME", &agent.tool.name);
    env_pair(&mut args, "TOOL_DESCRIPTION", &agent.tool.description);
    env_pair(&mut args, "TOOL_ARGUMENT_NAME", &agent.tool.argument_name);
    env_pair(
        &mut args,
        "TOOL_ARGUMENT_DESCRIPTION",
        &agent.tool.argument_description,
    );
    env_pair(&mut args, "LLM_PROVIDER", &agent.llm.provider);
    env_pair(&mut args, "LLM_API_KEY", "$LLM_API_KEY");
    env_pair(&mut args, "LLM_MODEL", &agent.llm.model);
    env_pair(&mut args, "RUNTIME_LOG_LEVEL", &config.runtime.log.level);
    args.push(CONTAINER_IMAGE.to_string());

    let entry = json!({
        "command": "docker",
        "args": args,
        "environment": {
            "LLM_API_KEY": API_KEY_PLACEHOLDER,
        },
    });
    to_pretty_4(&wrap(entry))
}

/// Pushes a `-e KEY=value` flag pair onto the docker args.
fn env_pair(args: &mut Vec<String>, key: &str, value: &str) {
    args.push("-e".to_string());
    args.push(format!("{key}={value}"));
}

/// `mcpServers` envelope keyed by the agent binary name.
fn wrap(entry: serde_json::Value) -> serde_json::Value {
    let mut servers = serde_json::Map::new();
    servers.insert(AGENT_BINARY.to_string(), entry);
    let mut root = serde_json::Map::new();
    root.insert("mcpServers".to_string(), serde_json::Value::Object(servers));
    serde_json::Value::Object(root)
}

/// Pretty-print with four-space indentation.
fn to_pretty_4(value: &serde_json::Value) -> serde_json::Result<String> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(value, &mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::defaults;

    fn parse(snippet: &str) -> serde_json::Value {
        serde_json::from_str(snippet).expect("launcher snippet is valid json")
    }

    #[test]
    fn binary_launcher_nests_under_the_binary_name() {
        let snippet = binary_launcher(&defaults::config()).expect("render");
        let value = parse(&snippet);
        let entry = &value["mcpServers"][AGENT_BINARY];
        assert_eq!(entry["command"], "relay-agent");
        assert_eq!(entry["args"], json!([]));
        assert_eq!(entry["environment"]["AGENT_NAME"], "relay-agent");
        assert_eq!(entry["environment"]["LLM_MAX_TOKENS"], 0);
        assert_eq!(entry["environment"]["LLM_TEMPERATURE"], 0.7);
    }

    #[test]
    fn binary_launcher_redacts_the_api_key() {
        let mut config = defaults::config();
        config.agent.llm.api_key = "sk-supersecret".to_string();
        let snippet = binary_launcher(&config).expect("render");
        assert!(!snippet.contains("sk-supersecret"));
        let value = parse(&snippet);
        assert_eq!(
            value["mcpServers"][AGENT_BINARY]["environment"]["LLM_API_KEY"],
            API_KEY_PLACEHOLDER
        );
    }

    #[test]
    fn container_launcher_builds_docker_run_args() {
        let snippet = container_launcher(&defaults::config()).expect("render");
        let value = parse(&snippet);
        let entry = &value["mcpServers"][AGENT_BINARY];
        assert_eq!(entry["command"], "docker");
        let args: Vec<&str> = entry["args"]
            .as_array()
            .expect("args array")
            .iter()
            .map(|v| v.as_str().expect("string arg"))
            .collect();
        assert_eq!(&args[..3], &["run", "-i", "--rm"]);
        assert_eq!(*args.last().expect("image arg"), CONTAINER_IMAGE);
        assert!(args.contains(&"AGENT_NAME=relay-agent"));
        assert!(args.contains(&"LLM_API_KEY=$LLM_API_KEY"));
        assert_eq!(entry["environment"]["LLM_API_KEY"], API_KEY_PLACEHOLDER);
    }

    #[test]
    fn container_launcher_never_embeds_the_real_key() {
        let mut config = defaults::config();
        config.agent.llm.api_key = "sk-supersecret".to_string();
        let snippet = container_launcher(&config).expect("render");
        assert!(!snippet.contains("sk-supersecret"));
    }

    #[test]
    fn snippets_use_four_space_indentation() {
        let snippet = binary_launcher(&defaults::config()).expect("render");
        assert!(snippet.contains("\n    \"mcpServers\""));
        assert!(snippet.contains("\n        \"relay-agent\""));
    }
}
