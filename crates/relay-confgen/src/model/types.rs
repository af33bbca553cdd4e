//! The nested agent configuration record and its ordered collections.
//!
//! Field names and nesting mirror the JSON wire shape consumed by the
//! relay-agent runtime (`mcpServers` camelCase key, snake_case leaves).

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Complete configuration produced by the builder and consumed by the
/// renderer. Immutable once rendered; every input change triggers a full
/// rebuild, not an incremental patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub agent: AgentSection,
    pub runtime: RuntimeSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSection {
    pub name: String,
    pub version: String,
    pub tool: ToolConfig,
    pub llm: LlmConfig,
    pub connections: ConnectionsConfig,
}

/// The single MCP tool the agent exposes to its callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    pub description: String,
    pub argument_name: String,
    pub argument_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u64,
    pub temperature: f64,
    pub prompt_template: String,
    pub retry: RetryConfig,
}

/// Exponential backoff settings, shared by the LLM and connection layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u64,
    pub initial_backoff: f64,
    pub max_backoff: f64,
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionsConfig {
    #[serde(rename = "mcpServers")]
    pub mcp_servers: McpServers,
    pub retry: RetryConfig,
}

/// One external tool-connection definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConnection {
    pub command: String,
    pub args: Vec<String>,
    pub environment: OrderedMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSection {
    pub log: LogConfig,
    pub transports: TransportsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportsConfig {
    pub stdio: StdioTransport,
    pub http: HttpTransport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdioTransport {
    pub enabled: bool,
    pub buffer_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpTransport {
    pub enabled: bool,
    pub host: String,
    pub port: u64,
}

/// Server definitions keyed by id, kept in insertion order. Serializes as
/// a JSON object. Inserting an existing id overwrites the entry in place,
/// so indices stay stable for env-script expansion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct McpServers(Vec<(String, ServerConnection)>);

impl McpServers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, id: String, conn: ServerConnection) {
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| *k == id) {
            entry.1 = conn;
        } else {
            self.0.push((id, conn));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServerConnection)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for McpServers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, conn) in &self.0 {
            map.serialize_entry(id, conn)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for McpServers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct McpServersVisitor;

        impl<'de> Visitor<'de> for McpServersVisitor {
            type Value = McpServers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of server id to server connection")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = McpServers::new();
                while let Some((id, conn)) = access.next_entry::<String, ServerConnection>()? {
                    out.insert(id, conn);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(McpServersVisitor)
    }
}

/// String-to-string map that preserves insertion order, used for server
/// environment variables. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedMap(Vec<(String, String)>);

impl OrderedMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, key: String, value: String) {
        if let Some(entry) = self.0.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for OrderedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor;

        impl<'de> Visitor<'de> for OrderedMapVisitor {
            type Value = OrderedMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string to string")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = OrderedMap::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    out.insert(k, v);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor)
    }
}
