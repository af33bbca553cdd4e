//! Central defaults table.
//!
//! Single source of truth for every default value: the builder substitutes
//! these for absent form fields, the form uses them for its pristine state
//! and new-server template, and the upload path fills them in for absent
//! nested fields of imported configs.

use super::types::{
    AgentConfig, AgentSection, ConnectionsConfig, HttpTransport, LlmConfig, LogConfig, McpServers,
    RetryConfig, RuntimeSection, StdioTransport, ToolConfig, TransportsConfig,
};

pub const AGENT_NAME: &str = "relay-agent";
pub const AGENT_VERSION: &str = "1.0.0";

pub const TOOL_NAME: &str = "process";
pub const TOOL_DESCRIPTION: &str = "Process user queries with LLM";
pub const TOOL_ARGUMENT_NAME: &str = "input";
pub const TOOL_ARGUMENT_DESCRIPTION: &str = "The user query to process";

pub const LLM_PROVIDER: &str = "openai";
pub const LLM_MODEL: &str = "gpt-4";
/// Stand-in shown when no key was supplied; never a real secret.
pub const LLM_API_KEY: &str = "YOUR_API_KEY_HERE";
pub const LLM_MAX_TOKENS: u64 = 0;
pub const LLM_TEMPERATURE: f64 = 0.7;
pub const LLM_PROMPT_TEMPLATE: &str = "You are a helpful assistant. Respond to the following request: {{input}}. Available tools: {{tools}}";

pub const RETRY_MAX_RETRIES: u64 = 3;
pub const RETRY_INITIAL_BACKOFF: f64 = 1.0;
pub const RETRY_MAX_BACKOFF: f64 = 30.0;
pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

pub const LOG_LEVEL: &str = "info";
pub const LOG_OUTPUT: &str = "stderr";
pub const STDIO_ENABLED: bool = true;
pub const STDIO_BUFFER_SIZE: u64 = 8192;
pub const HTTP_ENABLED: bool = false;
pub const HTTP_HOST: &str = "localhost";
pub const HTTP_PORT: u64 = 3000;

/// New-server sub-form template, as raw form strings.
pub const SERVER_COMMAND: &str = "docker";
pub const SERVER_ARGS: &str = "run, -i, --rm, mcp/time";
pub const SERVER_ENVIRONMENT: &str = "NODE_ENV=production";

pub fn retry() -> RetryConfig {
    RetryConfig {
        max_retries: RETRY_MAX_RETRIES,
        initial_backoff: RETRY_INITIAL_BACKOFF,
        max_backoff: RETRY_MAX_BACKOFF,
        backoff_multiplier: RETRY_BACKOFF_MULTIPLIER,
    }
}

/// Fully-default config with no servers configured.
pub fn config() -> AgentConfig {
    AgentConfig {
        agent: AgentSection {
            name: AGENT_NAME.to_string(),
            version: AGENT_VERSION.to_string(),
            tool: ToolConfig {
                name: TOOL_NAME.to_string(),
                description: TOOL_DESCRIPTION.to_string(),
                argument_name: TOOL_ARGUMENT_NAME.to_string(),
                argument_description: TOOL_ARGUMENT_DESCRIPTION.to_string(),
            },
            llm: LlmConfig {
                provider: LLM_PROVIDER.to_string(),
                api_key: LLM_API_KEY.to_string(),
                model: LLM_MODEL.to_string(),
                max_tokens: LLM_MAX_TOKENS,
                temperature: LLM_TEMPERATURE,
                prompt_template: LLM_PROMPT_TEMPLATE.to_string(),
                retry: retry(),
            },
            connections: ConnectionsConfig {
                mcp_servers: McpServers::new(),
                retry: retry(),
            },
        },
        runtime: RuntimeSection {
            log: LogConfig {
                level: LOG_LEVEL.to_string(),
                output: LOG_OUTPUT.to_string(),
            },
            transports: TransportsConfig {
                stdio: StdioTransport {
                    enabled: STDIO_ENABLED,
                    buffer_size: STDIO_BUFFER_SIZE,
                },
                http: HttpTransport {
                    enabled: HTTP_ENABLED,
                    host: HTTP_HOST.to_string(),
                    port: HTTP_PORT,
                },
            },
        },
    }
}
