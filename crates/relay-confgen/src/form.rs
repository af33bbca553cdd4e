//! Form state snapshot and config-to-form synchronization.
//!
//! Responsibilities:
//! - Hold a snapshot of every named form field as raw strings (absent
//!   fields fall back to the defaults table at build time).
//! - Manage the dynamic list of server sub-forms through an ordered arena
//!   with stable, application-assigned slots (slots are never reused after
//!   removal; storage order is display order).
//! - Write a built or uploaded [`AgentConfig`] back onto the form.

use serde::Deserialize;

use crate::model::defaults;
use crate::model::{AgentConfig, ServerConnection};

/// Stable identifier for one server sub-form. Slot 0 is the "unassigned"
/// sentinel used for freshly deserialized forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ServerSlot(u64);

/// One repeated server sub-form: four raw string fields, exactly what the
/// user typed. Args are comma-separated; environment is comma-separated
/// `KEY=VALUE` pairs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerForm {
    #[serde(skip)]
    pub slot: ServerSlot,
    pub id: String,
    pub command: String,
    pub args: String,
    pub environment: String,
}

impl Default for ServerForm {
    fn default() -> Self {
        Self {
            slot: ServerSlot(0),
            id: String::new(),
            command: defaults::SERVER_COMMAND.to_string(),
            args: String::new(),
            environment: String::new(),
        }
    }
}

/// Snapshot of the whole configuration form. `None` means the field is
/// absent (default substituted at build time); `Some("")` is an explicit
/// empty value, which required-field validation rejects.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormState {
    pub agent_name: Option<String>,
    pub agent_version: Option<String>,

    pub tool_name: Option<String>,
    pub tool_description: Option<String>,
    pub tool_argument_name: Option<String>,
    pub tool_argument_description: Option<String>,

    pub llm_provider: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub llm_max_tokens: Option<String>,
    pub llm_temperature: Option<String>,
    pub llm_prompt_template: Option<String>,
    pub llm_retry_max_retries: Option<String>,
    pub llm_retry_initial_backoff: Option<String>,
    pub llm_retry_max_backoff: Option<String>,
    pub llm_retry_backoff_multiplier: Option<String>,

    pub conn_retry_max_retries: Option<String>,
    pub conn_retry_initial_backoff: Option<String>,
    pub conn_retry_max_backoff: Option<String>,
    pub conn_retry_backoff_multiplier: Option<String>,

    pub log_level: Option<String>,
    pub log_output: Option<String>,
    pub stdio_enabled: Option<String>,
    pub stdio_buffer_size: Option<String>,
    pub http_enabled: Option<String>,
    pub http_host: Option<String>,
    pub http_port: Option<String>,

    pub servers: Vec<ServerForm>,

    #[serde(skip)]
    next_slot: u64,
}

impl Default for FormState {
    fn default() -> Self {
        let mut state = Self {
            agent_name: None,
            agent_version: None,
            tool_name: None,
            tool_description: None,
            tool_argument_name: None,
            tool_argument_description: None,
            llm_provider: None,
            llm_api_key: None,
            llm_model: None,
            llm_max_tokens: None,
            llm_temperature: None,
            llm_prompt_template: None,
            llm_retry_max_retries: None,
            llm_retry_initial_backoff: None,
            llm_retry_max_backoff: None,
            llm_retry_backoff_multiplier: None,
            conn_retry_max_retries: None,
            conn_retry_initial_backoff: None,
            conn_retry_max_backoff: None,
            conn_retry_backoff_multiplier: None,
            log_level: None,
            log_output: None,
            stdio_enabled: None,
            stdio_buffer_size: None,
            http_enabled: None,
            http_host: None,
            http_port: None,
            servers: Vec::new(),
            next_slot: 1,
        };
        // A pristine form starts with one default server sub-form.
        state.add_server(None);
        state
    }
}

impl FormState {
    /// Parse a form-state document from TOML, then assign slots.
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let mut state: Self = toml::from_str(input)?;
        state.assign_slots();
        Ok(state)
    }

    /// Parse a form-state document from JSON, then assign slots.
    pub fn from_json_str(input: &str) -> anyhow::Result<Self> {
        let mut state: Self = serde_json::from_str(input)?;
        state.assign_slots();
        Ok(state)
    }

    /// Append one server sub-form, either from the defaults template or
    /// from a supplied server record. Returns the new stable slot.
    pub fn add_server(&mut self, template: Option<(&str, &ServerConnection)>) -> ServerSlot {
        let slot = ServerSlot(self.next_slot);
        self.next_slot += 1;
        let form = match template {
            Some((id, conn)) => ServerForm {
                slot,
                id: id.to_string(),
                command: conn.command.clone(),
                args: conn.args.join(", "),
                environment: conn
                    .environment
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            },
            None => ServerForm {
                slot,
                id: format!("server-{}", slot.0),
                command: defaults::SERVER_COMMAND.to_string(),
                args: defaults::SERVER_ARGS.to_string(),
                environment: defaults::SERVER_ENVIRONMENT.to_string(),
            },
        };
        self.servers.push(form);
        slot
    }

    /// Delete the sub-form with the given slot. Returns false when the
    /// slot does not exist (already removed, or never assigned).
    pub fn remove_server(&mut self, slot: ServerSlot) -> bool {
        let before = self.servers.len();
        self.servers.retain(|s| s.slot != slot);
        self.servers.len() != before
    }

    /// Write every config field back onto the form as raw strings and
    /// rebuild the server list. An empty server map still yields one
    /// default sub-form, matching the pristine-page behavior.
    pub fn apply_config(&mut self, config: &AgentConfig) {
        let agent = &config.agent;
        self.agent_name = Some(agent.name.clone());
        self.agent_version = Some(agent.version.clone());

        self.tool_name = Some(agent.tool.name.clone());
        self.tool_description = Some(agent.tool.description.clone());
        self.tool_argument_name = Some(agent.tool.argument_name.clone());
        self.tool_argument_description = Some(agent.tool.argument_description.clone());

        self.llm_provider = Some(agent.llm.provider.clone());
        self.llm_api_key = Some(agent.llm.api_key.clone());
        self.llm_model = Some(agent.llm.model.clone());
        self.llm_max_tokens = Some(agent.llm.max_tokens.to_string());
        self.llm_temperature = Some(agent.llm.temperature.to_string());
        self.llm_prompt_template = Some(agent.llm.prompt_template.clone());
        self.llm_retry_max_retries = Some(agent.llm.retry.max_retries.to_string());
        self.llm_retry_initial_backoff = Some(agent.llm.retry.initial_backoff.to_string());
        self.llm_retry_max_backoff = Some(agent.llm.retry.max_backoff.to_string());
        self.llm_retry_backoff_multiplier = Some(agent.llm.retry.backoff_multiplier.to_string());

        self.conn_retry_max_retries = Some(agent.connections.retry.max_retries.to_string());
        self.conn_retry_initial_backoff = Some(agent.connections.retry.initial_backoff.to_string());
        self.conn_retry_max_backoff = Some(agent.connections.retry.max_backoff.to_string());
        self.conn_retry_backoff_multiplier =
            Some(agent.connections.retry.backoff_multiplier.to_string());

        let runtime = &config.runtime;
        self.log_level = Some(runtime.log.level.clone());
        self.log_output = Some(runtime.log.output.clone());
        self.stdio_enabled = Some(runtime.transports.stdio.enabled.to_string());
        self.stdio_buffer_size = Some(runtime.transports.stdio.buffer_size.to_string());
        self.http_enabled = Some(runtime.transports.http.enabled.to_string());
        self.http_host = Some(runtime.transports.http.host.clone());
        self.http_port = Some(runtime.transports.http.port.to_string());

        self.servers.clear();
        for (id, conn) in agent.connections.mcp_servers.iter() {
            self.add_server(Some((id, conn)));
        }
        if self.servers.is_empty() {
            self.add_server(None);
        }
    }

    /// Give fresh slots to entries carrying the unassigned sentinel and
    /// advance the counter past every slot in use.
    fn assign_slots(&mut self) {
        let mut next = self
            .servers
            .iter()
            .map(|s| s.slot.0)
            .max()
            .unwrap_or(0)
            + 1;
        for server in &mut self.servers {
            if server.slot == ServerSlot(0) {
                server.slot = ServerSlot(next);
                next += 1;
            }
        }
        self.next_slot = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;

    #[test]
    fn pristine_form_has_one_default_server() {
        let state = FormState::default();
        assert_eq!(state.servers.len(), 1);
        let server = &state.servers[0];
        assert_eq!(server.id, "server-1");
        assert_eq!(server.command, defaults::SERVER_COMMAND);
        assert_eq!(server.args, defaults::SERVER_ARGS);
        assert_eq!(server.environment, defaults::SERVER_ENVIRONMENT);
    }

    #[test]
    fn add_then_remove_restores_prior_build_output() {
        let mut state = FormState::default();
        state.llm_api_key = Some("sk-test".to_string());
        let before = builder::build(&state).expect("valid form");

        let slot = state.add_server(None);
        assert_eq!(state.servers.len(), 2);
        assert!(state.remove_server(slot));
        assert!(!state.remove_server(slot), "slot must not be reusable");

        let after = builder::build(&state).expect("valid form");
        assert_eq!(before, after);
    }

    #[test]
    fn slots_stay_stable_after_removal() {
        let mut state = FormState::default();
        let second = state.add_server(None);
        let third = state.add_server(None);
        assert!(state.remove_server(second));
        // The later sub-form keeps its slot and its id.
        assert!(state.servers.iter().any(|s| s.slot == third));
        assert!(state.servers.iter().any(|s| s.id == "server-3"));
    }

    #[test]
    fn apply_config_fills_every_field() {
        let config = defaults::config();
        let mut state = FormState::default();
        state.apply_config(&config);

        assert_eq!(state.agent_name.as_deref(), Some(defaults::AGENT_NAME));
        assert_eq!(state.llm_temperature.as_deref(), Some("0.7"));
        assert_eq!(state.llm_retry_initial_backoff.as_deref(), Some("1"));
        assert_eq!(state.stdio_enabled.as_deref(), Some("true"));
        assert_eq!(state.http_port.as_deref(), Some("3000"));
        // Zero configured servers still leaves one default sub-form.
        assert_eq!(state.servers.len(), 1);
    }

    #[test]
    fn apply_then_build_round_trips() {
        let mut source = FormState::default();
        source.agent_name = Some("demo".to_string());
        source.llm_api_key = Some("sk-live".to_string());
        source.llm_temperature = Some("0.25".to_string());
        let config = builder::build(&source).expect("valid form");

        let mut target = FormState::default();
        target.apply_config(&config);
        let rebuilt = builder::build(&target).expect("valid form");
        assert_eq!(config, rebuilt);
    }

    #[test]
    fn form_file_without_servers_key_gets_default_server() {
        let state = FormState::from_toml_str("agent_name = \"demo\"").expect("parse");
        assert_eq!(state.agent_name.as_deref(), Some("demo"));
        assert_eq!(state.servers.len(), 1);
    }

    #[test]
    fn deserialized_servers_receive_slots() {
        let doc = r#"
agent_name = "demo"

[[servers]]
id = "time"
command = "docker"
args = "run, -i, --rm, mcp/time"
environment = "NODE_ENV=production"

[[servers]]
id = "fetch"
command = "npx"
args = "mcp-fetch"
environment = ""
"#;
        let mut state = FormState::from_toml_str(doc).expect("parse");
        let slots: Vec<ServerSlot> = state.servers.iter().map(|s| s.slot).collect();
        assert_eq!(slots.len(), 2);
        assert_ne!(slots[0], slots[1]);
        assert_ne!(slots[0], ServerSlot(0));
        // New additions continue past the assigned range.
        let fresh = state.add_server(None);
        assert!(!slots.contains(&fresh));
    }
}
