//! Devcontainer configuration document handling — pure functions only.
//!
//! The document is JSON-with-extensions (comments, trailing commas), modeled
//! as a `serde_json` object tree. Every known-field access goes through the
//! accessors here so the rest of the crate never does ad hoc tree walking.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::error::ResolveError;

/// Environment key pointing at the resolved workspace folder. Always present
/// in a resolved configuration and always wins over other env sources.
pub const ENV_PROJECT_DIR: &str = "BERTH_PROJECT_DIR";

/// Where the rewritten override configuration is materialized inside the
/// build container.
pub const OVERRIDE_CONFIG_PATH: &str = "/tmp/berth-devcontainer.json";

/// Where the rewritten compose file is materialized inside the build
/// container.
pub const COMPOSE_OVERRIDE_PATH: &str = "/tmp/berth-compose-override.yml";

/// Strip JSONC extensions (line/block comments, trailing commas) so the
/// document parses as strict JSON. String contents are left untouched.
/// Comments go first so a comma trailing a comment is still recognized.
#[must_use]
pub fn normalize(input: &str) -> String {
    strip_trailing_commas(&strip_comments(input))
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    chars.next();
                    for n in chars.by_ref() {
                        if n == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for n in chars.by_ref() {
                        if prev == '*' && n == '/' {
                            break;
                        }
                        prev = n;
                    }
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }

    out
}

fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                // Hold the comma until the next significant character shows
                // whether it is trailing.
                let mut pending = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_whitespace() {
                        pending.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !matches!(chars.peek(), Some(&'}') | Some(&']')) {
                    out.push(',');
                }
                out.push_str(&pending);
            }
            _ => out.push(c),
        }
    }

    out
}

/// A parsed devcontainer configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevcontainerConfig(Map<String, Value>);

impl DevcontainerConfig {
    /// Parse a raw (possibly JSONC) document. A parse failure is fatal to the
    /// resolve operation.
    pub fn parse(raw: &str, path: &str) -> Result<Self, ResolveError> {
        let normalized = normalize(raw);
        let value: Value =
            serde_json::from_str(&normalized).map_err(|e| ResolveError::Parse {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ResolveError::Parse {
                path: path.to_string(),
                message: format!("expected a JSON object, found {other}"),
            }),
        }
    }

    #[must_use]
    pub fn workspace_folder(&self) -> Option<&str> {
        self.0.get("workspaceFolder").and_then(Value::as_str)
    }

    pub fn set_workspace_folder(&mut self, folder: &str) {
        self.0
            .insert("workspaceFolder".into(), Value::String(folder.into()));
    }

    /// The document's own `containerEnv`, string values only.
    #[must_use]
    pub fn container_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Some(Value::Object(map)) = self.0.get("containerEnv") {
            for (k, v) in map {
                if let Value::String(s) = v {
                    env.insert(k.clone(), s.clone());
                }
            }
        }
        env
    }

    pub fn set_container_env(&mut self, env: &BTreeMap<String, String>) {
        let map: Map<String, Value> = env
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.0.insert("containerEnv".into(), Value::Object(map));
    }

    #[must_use]
    pub fn docker_compose_file(&self) -> Option<&str> {
        self.0.get("dockerComposeFile").and_then(Value::as_str)
    }

    pub fn set_docker_compose_file(&mut self, path: &str) {
        self.0
            .insert("dockerComposeFile".into(), Value::String(path.into()));
    }

    /// Bind the host project directory at the workspace folder.
    pub fn set_workspace_mount(&mut self, source: &str, target: &str) {
        self.0.insert(
            "workspaceMount".into(),
            Value::String(format!("source={source},target={target},type=bind")),
        );
    }

    #[must_use]
    pub fn workspace_mount(&self) -> Option<&str> {
        self.0.get("workspaceMount").and_then(Value::as_str)
    }

    /// Serialize the final document for `--override-config` embedding.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Value::Object(self.0.clone()))
    }
}

/// Merge environment sources in resolution order: document defaults, then the
/// project's own variables, then the workspace-folder marker on top.
#[must_use]
pub fn merge_env(
    doc_env: &BTreeMap<String, String>,
    project_env: &BTreeMap<String, String>,
    workspace_folder: &str,
) -> BTreeMap<String, String> {
    let mut env = doc_env.clone();
    for (k, v) in project_env {
        env.insert(k.clone(), v.clone());
    }
    env.insert(ENV_PROJECT_DIR.into(), workspace_folder.into());
    env
}

/// Rewrite an external compose file for execution inside the build container:
/// parent-directory volume references point at the bind-mounted project
/// directory, quotes are escaped for safe single-quoted shell embedding, and
/// the build context is re-pointed at the mounted configuration directory.
#[must_use]
pub fn rewrite_compose(content: &str, project_dir: &str, mounted_config_dir: &str) -> String {
    let rewritten = content.replace("- ..:", &format!("- {project_dir}:"));
    let escaped = rewritten.replace('\'', r#"'"'"'"#);
    escaped.replace("context: .", &format!("context: {mounted_config_dir}"))
}

/// Locate the first JSON object in the read-configuration output. The tool
/// prints log lines before the document, so everything up to the first `{`
/// is discarded.
pub fn scrape_json(output: &str) -> Result<&str, ResolveError> {
    output
        .find('{')
        .map(|idx| &output[idx..])
        .ok_or(ResolveError::NoJsonInOutput)
}

/// Extract a top-level string property from compact JSON tool output.
#[must_use]
pub fn extract_property(json: &str, prop: &str) -> Option<String> {
    let pattern = format!(r#""{}":\s*"([^"]+)""#, regex::escape(prop));
    let re = regex::Regex::new(&pattern).ok()?;
    re.captures(json)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
