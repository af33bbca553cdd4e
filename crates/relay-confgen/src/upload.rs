//! Tolerant parsing of imported configuration JSON.
//!
//! An uploaded file only has to carry `agent` and `runtime` objects;
//! every nested field is optional and absent fields resolve to the
//! defaults table. Two legacy shapes are also accepted: a `servers`
//! array instead of the `mcpServers` object, and environment given as a
//! `KEY=VALUE` string list instead of an object.

use serde::Deserialize;
use serde_json::Value;

use crate::error::UploadError;
use crate::model::defaults;
use crate::model::{AgentConfig, McpServers, OrderedMap, ServerConnection};

/// Parse uploaded JSON into a fully resolved config.
pub fn parse(input: &str) -> Result<AgentConfig, UploadError> {
    let value: Value = serde_json::from_str(input)?;
    for section in ["agent", "runtime"] {
        if !value.get(section).map(Value::is_object).unwrap_or(false) {
            return Err(UploadError::MissingSection(section));
        }
    }
    let partial: PartialConfig = serde_json::from_value(value)?;
    Ok(resolve(partial))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialConfig {
    agent: PartialAgent,
    runtime: PartialRuntime,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialAgent {
    name: Option<String>,
    version: Option<String>,
    tool: PartialTool,
    llm: PartialLlm,
    connections: PartialConnections,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialTool {
    name: Option<String>,
    description: Option<String>,
    argument_name: Option<String>,
    argument_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialLlm {
    provider: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u64>,
    temperature: Option<f64>,
    prompt_template: Option<String>,
    retry: PartialRetry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialRetry {
    max_retries: Option<u64>,
    initial_backoff: Option<f64>,
    max_backoff: Option<f64>,
    backoff_multiplier: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialConnections {
    #[serde(rename = "mcpServers")]
    mcp_servers: Option<serde_json::Map<String, Value>>,
    /// Legacy list form, superseded by `mcpServers`.
    servers: Option<Vec<LegacyServer>>,
    retry: PartialRetry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialServer {
    command: Option<String>,
    args: Option<Vec<String>>,
    /// Legacy spelling of `args`.
    arguments: Option<Vec<String>>,
    environment: Option<EnvField>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyServer {
    id: Option<String>,
    command: Option<String>,
    arguments: Option<Vec<String>>,
    environment: Option<EnvField>,
}

/// Environment as either an object or a `KEY=VALUE` string list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnvField {
    Map(serde_json::Map<String, Value>),
    List(Vec<String>),
}

fn resolve(partial: PartialConfig) -> AgentConfig {
    let mut config = defaults::config();

    let agent = partial.agent;
    set(&mut config.agent.name, agent.name);
    set(&mut config.agent.version, agent.version);

    let tool = &mut config.agent.tool;
    set(&mut tool.name, agent.tool.name);
    set(&mut tool.description, agent.tool.description);
    set(&mut tool.argument_name, agent.tool.argument_name);
    set(&mut tool.argument_description, agent.tool.argument_description);

    let llm = &mut config.agent.llm;
    set(&mut llm.provider, agent.llm.provider);
    set(&mut llm.api_key, agent.llm.api_key);
    set(&mut llm.model, agent.llm.model);
    set(&mut llm.max_tokens, agent.llm.max_tokens);
    set(&mut llm.temperature, agent.llm.temperature);
    set(&mut llm.prompt_template, agent.llm.prompt_template);
    apply_retry(&mut llm.retry, agent.llm.retry);

    let connections = agent.connections;
    config.agent.connections.mcp_servers =
        resolve_servers(connections.mcp_servers, connections.servers);
    apply_retry(&mut config.agent.connections.retry, connections.retry);

    let runtime = partial.runtime;
    set(&mut config.runtime.log.level, runtime.log.level);
    set(&mut config.runtime.log.output, runtime.log.output);

    let stdio = &mut config.runtime.transports.stdio;
    set(&mut stdio.enabled, runtime.transports.stdio.enabled);
    set(&mut stdio.buffer_size, runtime.transports.stdio.buffer_size);

    let http = &mut config.runtime.transports.http;
    set(&mut http.enabled, runtime.transports.http.enabled);
    set(&mut http.host, runtime.transports.http.host);
    set(&mut http.port, runtime.transports.http.port);

    config
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialRuntime {
    log: PartialLog,
    transports: PartialTransports,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialLog {
    level: Option<String>,
    output: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialTransports {
    stdio: PartialStdio,
    http: PartialHttp,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialStdio {
    enabled: Option<bool>,
    buffer_size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialHttp {
    enabled: Option<bool>,
    host: Option<String>,
    port: Option<u64>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn apply_retry(target: &mut crate::model::RetryConfig, partial: PartialRetry) {
    set(&mut target.max_retries, partial.max_retries);
    set(&mut target.initial_backoff, partial.initial_backoff);
    set(&mut target.max_backoff, partial.max_backoff);
    set(&mut target.backoff_multiplier, partial.backoff_multiplier);
}

/// `mcpServers` wins over the legacy `servers` list when both appear.
/// Malformed individual server entries are skipped rather than failing
/// the whole import.
fn resolve_servers(
    mcp_servers: Option<serde_json::Map<String, Value>>,
    legacy: Option<Vec<LegacyServer>>,
) -> McpServers {
    let mut out = McpServers::new();
    if let Some(map) = mcp_servers {
        for (id, value) in map {
            let Ok(server) = serde_json::from_value::<PartialServer>(value) else {
                tracing::warn!(id = %id, "skipping malformed server entry");
                continue;
            };
            let args = server.args.or(server.arguments).unwrap_or_default();
            out.insert(id, connection(server.command, args, server.environment));
        }
        return out;
    }
    if let Some(servers) = legacy {
        for (index, server) in servers.into_iter().enumerate() {
            let id = server.id.unwrap_or_else(|| format!("server-{index}"));
            out.insert(
                id,
                connection(
                    server.command,
                    server.arguments.unwrap_or_default(),
                    server.environment,
                ),
            );
        }
    }
    out
}

fn connection(
    command: Option<String>,
    args: Vec<String>,
    environment: Option<EnvField>,
) -> ServerConnection {
    ServerConnection {
        command: command.unwrap_or_else(|| defaults::SERVER_COMMAND.to_string()),
        args,
        environment: environment.map(env_field).unwrap_or_default(),
    }
}

fn env_field(field: EnvField) -> OrderedMap {
    let mut env = OrderedMap::new();
    match field {
        EnvField::Map(map) => {
            for (key, value) in map {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                env.insert(key, value);
            }
        }
        EnvField::List(entries) => {
            for entry in entries {
                if let Some((key, value)) = entry.split_once('=') {
                    env.insert(key.trim().to_string(), value.trim().to_string());
                }
            }
        }
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sections_resolve_to_defaults() {
        let config = parse(r#"{"agent": {}, "runtime": {}}"#).expect("minimal upload");
        assert_eq!(config, defaults::config());
    }

    #[test]
    fn missing_runtime_is_rejected() {
        let err = parse(r#"{"agent": {}}"#).expect_err("must fail");
        assert!(matches!(err, UploadError::MissingSection("runtime")));
    }

    #[test]
    fn non_object_agent_is_rejected() {
        let err = parse(r#"{"agent": "yes", "runtime": {}}"#).expect_err("must fail");
        assert!(matches!(err, UploadError::MissingSection("agent")));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse("{not json").expect_err("must fail");
        assert!(matches!(err, UploadError::InvalidJson(_)));
    }

    #[test]
    fn nested_fields_override_defaults() {
        let config = parse(
            r#"{
                "agent": {
                    "name": "imported",
                    "llm": {"model": "gpt-4o", "temperature": 0.2}
                },
                "runtime": {"log": {"level": "debug"}}
            }"#,
        )
        .expect("partial upload");
        assert_eq!(config.agent.name, "imported");
        assert_eq!(config.agent.llm.model, "gpt-4o");
        assert_eq!(config.agent.llm.temperature, 0.2);
        assert_eq!(config.agent.llm.provider, defaults::LLM_PROVIDER);
        assert_eq!(config.runtime.log.level, "debug");
        assert_eq!(config.runtime.log.output, defaults::LOG_OUTPUT);
    }

    #[test]
    fn mcp_servers_object_is_imported_in_order() {
        let config = parse(
            r#"{
                "agent": {"connections": {"mcpServers": {
                    "time": {
                        "command": "docker",
                        "args": ["run", "-i", "--rm", "mcp/time"],
                        "environment": {"NODE_ENV": "production", "PORT": 8080}
                    }
                }}},
                "runtime": {}
            }"#,
        )
        .expect("upload with servers");
        let servers: Vec<_> = config.agent.connections.mcp_servers.iter().collect();
        assert_eq!(servers.len(), 1);
        let (id, conn) = servers[0];
        assert_eq!(id, "time");
        assert_eq!(conn.args, vec!["run", "-i", "--rm", "mcp/time"]);
        assert_eq!(
            conn.environment.iter().collect::<Vec<_>>(),
            vec![("NODE_ENV", "production"), ("PORT", "8080")]
        );
    }

    #[test]
    fn legacy_servers_array_is_accepted() {
        let config = parse(
            r#"{
                "agent": {"connections": {"servers": [
                    {"command": "npx", "arguments": ["-y", "some-tool"]},
                    {"id": "named", "environment": ["NODE_ENV=production"]}
                ]}},
                "runtime": {}
            }"#,
        )
        .expect("legacy upload");
        let servers: Vec<_> = config.agent.connections.mcp_servers.iter().collect();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].0, "server-0");
        assert_eq!(servers[0].1.command, "npx");
        assert_eq!(servers[0].1.args, vec!["-y", "some-tool"]);
        assert_eq!(servers[1].0, "named");
        assert_eq!(servers[1].1.command, defaults::SERVER_COMMAND);
        assert_eq!(
            servers[1].1.environment.iter().collect::<Vec<_>>(),
            vec![("NODE_ENV", "production")]
        );
    }

    #[test]
    fn legacy_args_spelling_is_accepted_in_server_objects() {
        let config = parse(
            r#"{
                "agent": {"connections": {"mcpServers": {
                    "tool": {"command": "npx", "arguments": ["-y", "tool"]}
                }}},
                "runtime": {}
            }"#,
        )
        .expect("upload");
        let (_, conn) = config
            .agent
            .connections
            .mcp_servers
            .iter()
            .next()
            .expect("one server");
        assert_eq!(conn.args, vec!["-y", "tool"]);
    }
}
