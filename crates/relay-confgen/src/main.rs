use std::path::Path;

use anyhow::{Context, bail};
use env_flags::env_flags;

use relay_confgen::form::FormState;
use relay_confgen::{builder, render, upload};

fn init_tracing() {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true).
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
    }

    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, prelude::*};

    let filter =
        EnvFilter::try_new((*RUST_LOG).to_string()).unwrap_or_else(|_| EnvFilter::new("info"));
    // Always write logs to stderr so stdout carries only the emitted artifact.
    let base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr);
    let reg = tracing_subscriber::registry().with(filter);
    if *TRACING_JSON {
        if let Err(e) = reg.with(base.json()).try_init() {
            tracing::debug!("tracing already set: {:?}", e);
        }
    } else if *TRACING_COMPACT {
        if let Err(e) = reg.with(base.compact()).try_init() {
            tracing::debug!("tracing already set: {:?}", e);
        }
    } else if *TRACING_PRETTY {
        if let Err(e) = reg.with(base.pretty()).try_init() {
            tracing::debug!("tracing already set: {:?}", e);
        }
    } else if let Err(e) = reg.with(base).try_init() {
        tracing::debug!("tracing already set: {:?}", e);
    }
}

/// Read a saved form snapshot, dispatching on file extension.
fn load_form_state(path: &Path) -> anyhow::Result<FormState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading form file {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => FormState::from_toml_str(&raw)
            .with_context(|| format!("parsing form file {}", path.display())),
        Some("json") => FormState::from_json_str(&raw)
            .with_context(|| format!("parsing form file {}", path.display())),
        other => bail!(
            "unsupported form file extension {:?} for {}",
            other,
            path.display()
        ),
    }
}

/// Merge an imported config file onto the form. Import failures of any
/// kind (unreadable file, malformed content) abort the import only; the
/// current form state stays untouched.
fn import_onto(state: &mut FormState, path: &Path) {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                "import rejected, keeping current form state: reading {}: {}",
                path.display(),
                e
            );
            return;
        }
    };
    match upload::parse(&raw) {
        Ok(config) => {
            state.apply_config(&config);
            tracing::info!("imported configuration from {}", path.display());
        }
        Err(e) => {
            tracing::warn!("import rejected, keeping current form state: {}", e);
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    env_flags! {
        /// Optional form snapshot to start from (.toml or .json). Empty = pristine form.
        FORM_FILE: &str = "";
        /// Optional config JSON to import onto the form before building.
        IMPORT_FILE: &str = "";
        /// Which artifact to print: "json", "env", "binary", "container", or "all" (write files).
        EMIT: &str = "json";
        /// Output directory for EMIT=all.
        OUT_DIR: &str = ".";
    }

    let mut state = if (*FORM_FILE).is_empty() {
        FormState::default()
    } else {
        load_form_state(Path::new(*FORM_FILE))?
    };

    if !(*IMPORT_FILE).is_empty() {
        import_onto(&mut state, Path::new(*IMPORT_FILE));
    }

    let config = match builder::build(&state) {
        Ok(config) => config,
        Err(failure) => {
            for err in &failure.errors {
                tracing::error!("invalid field: {}", err);
            }
            tracing::error!("{}", failure);
            std::process::exit(1);
        }
    };
    tracing::info!(
        agent = %config.agent.name,
        servers = config.agent.connections.mcp_servers.len(),
        "configuration built"
    );

    let rendered = render::render(&config)?;
    match *EMIT {
        "json" => println!("{}", rendered.config_json),
        "env" => println!("{}", rendered.env_script),
        "binary" => println!("{}", rendered.binary_launcher),
        "container" => println!("{}", rendered.container_launcher),
        "all" => {
            let out_dir = Path::new(*OUT_DIR);
            std::fs::create_dir_all(out_dir)
                .with_context(|| format!("creating output dir {}", out_dir.display()))?;
            let outputs = [
                (rendered.file_name.as_str(), &rendered.config_json),
                ("env.sh", &rendered.env_script),
                ("binary-launcher.json", &rendered.binary_launcher),
                ("container-launcher.json", &rendered.container_launcher),
            ];
            for (name, contents) in outputs {
                let path = out_dir.join(name);
                std::fs::write(&path, contents)
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!("wrote {}", path.display());
            }
        }
        other => bail!("unknown EMIT mode {:?}", other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn form_file_loads_by_extension() {
        let mut toml_file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp file");
        writeln!(toml_file, "agent_name = \"from-toml\"").expect("write");
        let state = load_form_state(toml_file.path()).expect("load toml");
        assert_eq!(state.agent_name.as_deref(), Some("from-toml"));

        let mut json_file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("create temp file");
        write!(json_file, "{{\"agent_name\": \"from-json\"}}").expect("write");
        let state = load_form_state(json_file.path()).expect("load json");
        assert_eq!(state.agent_name.as_deref(), Some("from-json"));
    }

    #[test]
    fn unreadable_import_keeps_current_form_state() {
        let mut state = FormState::default();
        state.agent_name = Some("kept".to_string());
        let before = state.clone();
        import_onto(&mut state, Path::new("/nonexistent/import.json"));
        assert_eq!(state, before);
    }

    #[test]
    fn malformed_import_keeps_current_form_state() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("create temp file");
        write!(file, "{{\"agent\": {{}}}}").expect("write");

        let mut state = FormState::default();
        state.agent_name = Some("kept".to_string());
        let before = state.clone();
        import_onto(&mut state, file.path());
        assert_eq!(state, before);
    }

    #[test]
    fn valid_import_is_applied_to_the_form() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("create temp file");
        write!(file, "{{\"agent\": {{\"name\": \"imported\"}}, \"runtime\": {{}}}}")
            .expect("write");

        let mut state = FormState::default();
        import_onto(&mut state, file.path());
        assert_eq!(state.agent_name.as_deref(), Some("imported"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("create temp file");
        assert!(load_form_state(file.path()).is_err());
    }
}
