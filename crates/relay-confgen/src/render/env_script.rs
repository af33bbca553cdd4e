//! Environment-variable shell script rendering.
//!
//! Emits one `export` line per setting, grouped under comment headers.
//! Every line is emitted even when the value matches its default, so the
//! script fully determines the runtime's configuration. The API key is
//! never written out; its line carries a literal `...` placeholder.

use crate::model::AgentConfig;

pub fn render(config: &AgentConfig) -> String {
    let agent = &config.agent;
    let runtime = &config.runtime;
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Agent".to_string());
    lines.push(quoted("AGENT_NAME", &agent.name));
    lines.push(quoted("AGENT_VERSION", &agent.version));

    lines.push(String::new());
    lines.push("# Tool".to_string());
    lines.push(quoted("TOOL_NAME", &agent.tool.name));
    lines.push(quoted("TOOL_DESCRIPTION", &agent.tool.description));
    lines.push(quoted("TOOL_ARGUMENT_NAME", &agent.tool.argument_name));
    lines.push(quoted(
        "TOOL_ARGUMENT_DESCRIPTION",
        &agent.tool.argument_description,
    ));

    lines.push(String::new());
    lines.push("# LLM".to_string());
    lines.push(quoted("LLM_PROVIDER", &agent.llm.provider));
    // Secrets stay out of the script; the user fills this in themselves.
    lines.push(quoted("LLM_API_KEY", "..."));
    lines.push(quoted("LLM_MODEL", &agent.llm.model));
    lines.push(bare("LLM_MAX_TOKENS", agent.llm.max_tokens));
    lines.push(bare("LLM_TEMPERATURE", agent.llm.temperature));
    lines.push(quoted("LLM_PROMPT_TEMPLATE", &agent.llm.prompt_template));

    lines.push(String::new());
    lines.push("# LLM Retry".to_string());
    lines.push(bare("LLM_RETRY_MAX_RETRIES", agent.llm.retry.max_retries));
    lines.push(bare(
        "LLM_RETRY_INITIAL_BACKOFF",
        agent.llm.retry.initial_backoff,
    ));
    lines.push(bare("LLM_RETRY_MAX_BACKOFF", agent.llm.retry.max_backoff));
    lines.push(bare(
        "LLM_RETRY_BACKOFF_MULTIPLIER",
        agent.llm.retry.backoff_multiplier,
    ));

    lines.push(String::new());
    lines.push("# MCP Servers".to_string());
    for (index, (id, conn)) in agent.connections.mcp_servers.iter().enumerate() {
        lines.push(quoted(&format!("MCPS_{index}_ID"), id));
        lines.push(quoted(&format!("MCPS_{index}_COMMAND"), &conn.command));
        lines.push(quoted(&format!("MCPS_{index}_ARGS"), &conn.args.join(" ")));
        for (key, value) in conn.environment.iter() {
            lines.push(quoted(&format!("MCPS_{index}_ENV_{key}"), value));
        }
        lines.push(String::new());
    }

    // Historic variable spelling, kept for runtime compatibility.
    lines.push("# MSPS Retry".to_string());
    let conn_retry = &agent.connections.retry;
    lines.push(bare("MSPS_RETRY_MAX_RETRIES", conn_retry.max_retries));
    lines.push(bare("MSPS_RETRY_INITIAL_BACKOFF", conn_retry.initial_backoff));
    lines.push(bare("MSPS_RETRY_MAX_BACKOFF", conn_retry.max_backoff));
    lines.push(bare(
        "MSPS_RETRY_BACKOFF_MULTIPLIER",
        conn_retry.backoff_multiplier,
    ));

    lines.push(String::new());
    lines.push("# Runtime".to_string());
    lines.push(quoted("RUNTIME_LOG_LEVEL", &runtime.log.level));
    lines.push(quoted("RUNTIME_LOG_OUTPUT", &runtime.log.output));

    lines.push(String::new());
    lines.push("# Transport - Stdio".to_string());
    lines.push(bare("RUNTIME_STDIO_ENABLED", runtime.transports.stdio.enabled));
    lines.push(bare(
        "RUNTIME_STDIO_BUFFER_SIZE",
        runtime.transports.stdio.buffer_size,
    ));

    lines.push(String::new());
    lines.push("# Transport - HTTP".to_string());
    lines.push(bare("RUNTIME_HTTP_ENABLED", runtime.transports.http.enabled));
    lines.push(quoted("RUNTIME_HTTP_HOST", &runtime.transports.http.host));
    lines.push(bare("RUNTIME_HTTP_PORT", runtime.transports.http.port));

    lines.join("\n")
}

/// `export NAME="value"` with embedded double quotes escaped.
fn quoted(name: &str, value: &str) -> String {
    format!("export {name}=\"{}\"", value.replace('"', "\\\""))
}

/// `export NAME=value` for numerics and booleans.
fn bare<T: std::fmt::Display>(name: &str, value: T) -> String {
    format!("export {name}={value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::defaults;
    use crate::model::{OrderedMap, ServerConnection};

    fn config_with_time_server() -> AgentConfig {
        let mut config = defaults::config();
        let mut env = OrderedMap::new();
        env.insert("NODE_ENV".to_string(), "production".to_string());
        config.agent.connections.mcp_servers.insert(
            "time".to_string(),
            ServerConnection {
                command: "docker".to_string(),
                args: vec![
                    "run".to_string(),
                    "-i".to_string(),
                    "--rm".to_string(),
                    "mcp/time".to_string(),
                ],
                environment: env,
            },
        );
        config
    }

    #[test]
    fn server_block_lines_are_indexed_and_quoted() {
        let script = render(&config_with_time_server());
        assert!(script.contains("export MCPS_0_ID=\"time\""));
        assert!(script.contains("export MCPS_0_COMMAND=\"docker\""));
        assert!(script.contains("export MCPS_0_ARGS=\"run -i --rm mcp/time\""));
        assert!(script.contains("export MCPS_0_ENV_NODE_ENV=\"production\""));
    }

    #[test]
    fn section_headers_appear_in_order() {
        let script = render(&defaults::config());
        let headers = [
            "# Agent",
            "# Tool",
            "# LLM",
            "# LLM Retry",
            "# MCP Servers",
            "# MSPS Retry",
            "# Runtime",
            "# Transport - Stdio",
            "# Transport - HTTP",
        ];
        let mut last = 0;
        for header in headers {
            let pos = script.find(header).unwrap_or_else(|| {
                panic!("missing header {header}");
            });
            assert!(pos >= last, "{header} out of order");
            last = pos;
        }
    }

    #[test]
    fn zero_servers_emit_no_server_lines() {
        let script = render(&defaults::config());
        assert!(!script.contains("MCPS_"));
        // The retry section directly follows the empty server section.
        assert!(script.contains("# MCP Servers\n# MSPS Retry"));
    }

    #[test]
    fn api_key_is_never_written() {
        let mut config = defaults::config();
        config.agent.llm.api_key = "sk-supersecret".to_string();
        let script = render(&config);
        assert!(!script.contains("sk-supersecret"));
        assert!(script.contains("export LLM_API_KEY=\"...\""));
    }

    #[test]
    fn numeric_values_render_without_quotes_or_padding() {
        let script = render(&defaults::config());
        assert!(script.contains("export LLM_MAX_TOKENS=0"));
        assert!(script.contains("export LLM_TEMPERATURE=0.7"));
        assert!(script.contains("export LLM_RETRY_INITIAL_BACKOFF=1\n"));
        assert!(script.contains("export LLM_RETRY_MAX_BACKOFF=30\n"));
        assert!(script.contains("export RUNTIME_STDIO_ENABLED=true"));
        assert!(script.contains("export RUNTIME_HTTP_ENABLED=false"));
    }

    #[test]
    fn quotes_inside_values_are_escaped() {
        let mut config = defaults::config();
        config.agent.llm.prompt_template =
            "Say \"hello\" to {{input}} using {{tools}}".to_string();
        let script = render(&config);
        assert!(script.contains(
            "export LLM_PROMPT_TEMPLATE=\"Say \\\"hello\\\" to {{input}} using {{tools}}\""
        ));
    }

    #[test]
    fn each_server_block_ends_with_a_blank_line() {
        let script = render(&config_with_time_server());
        assert!(script.contains("export MCPS_0_ENV_NODE_ENV=\"production\"\n\n# MSPS Retry"));
    }
}
