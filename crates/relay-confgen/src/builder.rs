//! Form-to-config derivation.
//!
//! `build` takes a [`FormState`] snapshot and produces a fully populated
//! [`AgentConfig`], or a [`ValidationFailure`] naming every violated field.
//! Violations are collected exhaustively; the first error never short-
//! circuits the rest. No partial config is ever returned.

use crate::error::{FieldError, FieldErrorKind, ValidationFailure};
use crate::form::FormState;
use crate::model::defaults;
use crate::model::{
    AgentConfig, AgentSection, ConnectionsConfig, HttpTransport, LlmConfig, LogConfig, McpServers,
    OrderedMap, RetryConfig, RuntimeSection, ServerConnection, StdioTransport, ToolConfig,
    TransportsConfig,
};

/// Derive a config from the form snapshot. Absent fields (`None`) take
/// their tabulated default; present-but-empty required fields fail.
pub fn build(state: &FormState) -> Result<AgentConfig, ValidationFailure> {
    let mut errors: Vec<FieldError> = Vec::new();

    // Resolve string fields against the defaults table.
    let agent_name = resolve(&state.agent_name, defaults::AGENT_NAME);
    let agent_version = resolve(&state.agent_version, defaults::AGENT_VERSION);
    let tool_name = resolve(&state.tool_name, defaults::TOOL_NAME);
    let tool_description = resolve(&state.tool_description, defaults::TOOL_DESCRIPTION);
    let tool_argument_name = resolve(&state.tool_argument_name, defaults::TOOL_ARGUMENT_NAME);
    let tool_argument_description = resolve(
        &state.tool_argument_description,
        defaults::TOOL_ARGUMENT_DESCRIPTION,
    );
    let llm_provider = resolve(&state.llm_provider, defaults::LLM_PROVIDER);
    let llm_api_key = resolve(&state.llm_api_key, defaults::LLM_API_KEY);
    let llm_model = resolve(&state.llm_model, defaults::LLM_MODEL);
    let llm_prompt_template = resolve(&state.llm_prompt_template, defaults::LLM_PROMPT_TEMPLATE);
    let log_level = resolve(&state.log_level, defaults::LOG_LEVEL);
    let log_output = resolve(&state.log_output, defaults::LOG_OUTPUT);
    let http_host = resolve(&state.http_host, defaults::HTTP_HOST);

    // Required fields, checked after default substitution so only an
    // explicit empty value fails.
    let required: [(&'static str, &'static str, &str); 7] = [
        ("agent_name", "Agent Name", &agent_name),
        ("tool_name", "Tool Name", &tool_name),
        ("tool_description", "Tool Description", &tool_description),
        ("llm_provider", "LLM Provider", &llm_provider),
        ("llm_api_key", "LLM API Key", &llm_api_key),
        ("llm_model", "LLM Model", &llm_model),
        ("llm_prompt_template", "Prompt Template", &llm_prompt_template),
    ];
    for (field, label, value) in required {
        if value.trim().is_empty() {
            errors.push(FieldError {
                field,
                label,
                kind: FieldErrorKind::Required,
            });
        }
    }

    // The template must reference both the configured tool argument and
    // the tools list.
    check_prompt_template(&llm_prompt_template, &tool_argument_name, &mut errors);

    // Numeric fields: parse and bound-check; on failure the tabulated
    // default stands in so derivation can keep collecting violations.
    let llm_max_tokens = check_int(
        "llm_max_tokens",
        "Max Tokens",
        &state.llm_max_tokens,
        0,
        None,
        defaults::LLM_MAX_TOKENS,
        &mut errors,
    );
    let llm_temperature = check_float(
        "llm_temperature",
        "Temperature",
        &state.llm_temperature,
        0.0,
        Some(1.0),
        defaults::LLM_TEMPERATURE,
        &mut errors,
    );
    let llm_retry = RetryConfig {
        max_retries: check_int(
            "llm_retry_max_retries",
            "Max Retries",
            &state.llm_retry_max_retries,
            1,
            None,
            defaults::RETRY_MAX_RETRIES,
            &mut errors,
        ),
        initial_backoff: check_float(
            "llm_retry_initial_backoff",
            "Initial Backoff",
            &state.llm_retry_initial_backoff,
            0.1,
            None,
            defaults::RETRY_INITIAL_BACKOFF,
            &mut errors,
        ),
        max_backoff: check_float(
            "llm_retry_max_backoff",
            "Max Backoff",
            &state.llm_retry_max_backoff,
            1.0,
            None,
            defaults::RETRY_MAX_BACKOFF,
            &mut errors,
        ),
        backoff_multiplier: check_float(
            "llm_retry_backoff_multiplier",
            "Backoff Multiplier",
            &state.llm_retry_backoff_multiplier,
            1.0,
            None,
            defaults::RETRY_BACKOFF_MULTIPLIER,
            &mut errors,
        ),
    };
    let conn_retry = RetryConfig {
        max_retries: check_int(
            "conn_retry_max_retries",
            "Connection Max Retries",
            &state.conn_retry_max_retries,
            1,
            None,
            defaults::RETRY_MAX_RETRIES,
            &mut errors,
        ),
        initial_backoff: check_float(
            "conn_retry_initial_backoff",
            "Connection Initial Backoff",
            &state.conn_retry_initial_backoff,
            0.1,
            None,
            defaults::RETRY_INITIAL_BACKOFF,
            &mut errors,
        ),
        max_backoff: check_float(
            "conn_retry_max_backoff",
            "Connection Max Backoff",
            &state.conn_retry_max_backoff,
            1.0,
            None,
            defaults::RETRY_MAX_BACKOFF,
            &mut errors,
        ),
        backoff_multiplier: check_float(
            "conn_retry_backoff_multiplier",
            "Connection Backoff Multiplier",
            &state.conn_retry_backoff_multiplier,
            1.0,
            None,
            defaults::RETRY_BACKOFF_MULTIPLIER,
            &mut errors,
        ),
    };
    let stdio_buffer_size = check_int(
        "stdio_buffer_size",
        "STDIO Buffer Size",
        &state.stdio_buffer_size,
        1024,
        None,
        defaults::STDIO_BUFFER_SIZE,
        &mut errors,
    );
    let http_port = check_int(
        "http_port",
        "HTTP Port",
        &state.http_port,
        1,
        Some(65535),
        defaults::HTTP_PORT,
        &mut errors,
    );

    let stdio_enabled = resolve_bool(&state.stdio_enabled, defaults::STDIO_ENABLED);
    let http_enabled = resolve_bool(&state.http_enabled, defaults::HTTP_ENABLED);

    // Server sub-forms: later duplicates of an id overwrite earlier ones
    // in place (insertion position kept).
    let mut mcp_servers = McpServers::new();
    for server in &state.servers {
        mcp_servers.insert(
            server.id.clone(),
            ServerConnection {
                command: server.command.clone(),
                args: parse_args(&server.args),
                environment: parse_environment(&server.environment),
            },
        );
    }

    if !errors.is_empty() {
        return Err(ValidationFailure { errors });
    }

    Ok(AgentConfig {
        agent: AgentSection {
            name: agent_name,
            version: agent_version,
            tool: ToolConfig {
                name: tool_name,
                description: tool_description,
                argument_name: tool_argument_name,
                argument_description: tool_argument_description,
            },
            llm: LlmConfig {
                provider: llm_provider,
                api_key: llm_api_key,
                model: llm_model,
                max_tokens: llm_max_tokens,
                temperature: llm_temperature,
                prompt_template: llm_prompt_template,
                retry: llm_retry,
            },
            connections: ConnectionsConfig {
                mcp_servers,
                retry: conn_retry,
            },
        },
        runtime: RuntimeSection {
            log: LogConfig {
                level: log_level,
                output: log_output,
            },
            transports: TransportsConfig {
                stdio: StdioTransport {
                    enabled: stdio_enabled,
                    buffer_size: stdio_buffer_size,
                },
                http: HttpTransport {
                    enabled: http_enabled,
                    host: http_host,
                    port: http_port,
                },
            },
        },
    })
}

/// Split a comma-separated args field, trimming each token. Empty tokens
/// (e.g. from a trailing comma) are dropped.
pub fn parse_args(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Split a comma-separated environment field into `KEY=VALUE` pairs on the
/// first `=` per token. Tokens without `=` are dropped silently.
pub fn parse_environment(raw: &str) -> OrderedMap {
    let mut env = OrderedMap::new();
    for token in raw.split(',') {
        if let Some((key, value)) = token.split_once('=') {
            env.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    env
}

fn resolve(value: &Option<String>, default: &str) -> String {
    match value {
        Some(v) => v.clone(),
        None => default.to_string(),
    }
}

fn resolve_bool(value: &Option<String>, default: bool) -> bool {
    match value {
        Some(v) => v.trim() == "true",
        None => default,
    }
}

fn check_prompt_template(template: &str, argument_name: &str, errors: &mut Vec<FieldError>) {
    let placeholders = extract_placeholders(template);
    let mut missing: Vec<&str> = Vec::new();
    for required in [argument_name, "tools"] {
        if !placeholders.iter().any(|p| p == required) {
            missing.push(required);
        }
    }
    if !missing.is_empty() {
        errors.push(FieldError {
            field: "llm_prompt_template",
            label: "Prompt Template",
            kind: FieldErrorKind::MissingPlaceholders {
                placeholders: missing.join(", "),
            },
        });
    }
}

/// Collect `{{ name }}` placeholder identifiers (ASCII alphanumerics and
/// underscores, surrounding whitespace allowed).
fn extract_placeholders(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        rest = &rest[start + 2..];
        let Some(end) = rest.find("}}") else { break };
        let inner = rest[..end].trim();
        if !inner.is_empty()
            && inner
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            out.push(inner.to_string());
        }
        rest = &rest[end + 2..];
    }
    out
}

fn check_int(
    field: &'static str,
    label: &'static str,
    value: &Option<String>,
    min: u64,
    max: Option<u64>,
    fallback: u64,
    errors: &mut Vec<FieldError>,
) -> u64 {
    let raw = match value {
        Some(v) => v.clone(),
        None => fallback.to_string(),
    };
    // Parse signed so out-of-range input (e.g. a negative count) reports
    // the violated bound rather than "not a number".
    let Ok(parsed) = raw.trim().parse::<i64>() else {
        errors.push(FieldError {
            field,
            label,
            kind: FieldErrorKind::NotNumeric,
        });
        return fallback;
    };
    if parsed < min as i64 {
        errors.push(FieldError {
            field,
            label,
            kind: FieldErrorKind::BelowMin { min: min as f64 },
        });
        return fallback;
    }
    if let Some(max) = max
        && parsed > max as i64
    {
        errors.push(FieldError {
            field,
            label,
            kind: FieldErrorKind::AboveMax { max: max as f64 },
        });
        return fallback;
    }
    parsed as u64
}

fn check_float(
    field: &'static str,
    label: &'static str,
    value: &Option<String>,
    min: f64,
    max: Option<f64>,
    fallback: f64,
    errors: &mut Vec<FieldError>,
) -> f64 {
    let raw = match value {
        Some(v) => v.clone(),
        None => fallback.to_string(),
    };
    let parsed = match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            errors.push(FieldError {
                field,
                label,
                kind: FieldErrorKind::NotNumeric,
            });
            return fallback;
        }
    };
    if parsed < min {
        errors.push(FieldError {
            field,
            label,
            kind: FieldErrorKind::BelowMin { min },
        });
        return fallback;
    }
    if let Some(max) = max
        && parsed > max
    {
        errors.push(FieldError {
            field,
            label,
            kind: FieldErrorKind::AboveMax { max },
        });
        return fallback;
    }
    parsed
}
