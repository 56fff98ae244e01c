//! Process-wide tool catalog.
//!
//! The registry is an explicit, constructed object — built once at startup,
//! then shared read-only behind an `Arc`. Registration is additive and
//! name-keyed; the last registration for a name wins, which lazy skill
//! loading relies on deliberately.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use valet_contracts::{
    error::{ValetError, ValetResult},
    tool::{ExecutionSurface, SkillManifest, ToolSpec},
};

use crate::traits::{DeviceToolSpec, ServerTool, Tool};

/// Catalog mapping qualified tool names to capability instances, partitioned
/// by execution surface, plus the skill manifests that installed them.
///
/// Keys are kept in a `BTreeMap` so spec listings (and therefore system
/// prompts) are deterministic across runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
    skills: Vec<SkillManifest>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its qualified name. Last registration wins.
    ///
    /// Names must be `namespace.action` with exactly one `.` and only
    /// lowercase letters, digits, and underscores in each part. This is
    /// what keeps the LLM-facing `.` ↔ `-` name substitution a bijection.
    pub fn register(&mut self, tool: Tool) -> ValetResult<()> {
        let name = tool.name().to_string();
        validate_tool_name(&name)?;
        debug!(tool = %name, surface = ?tool.execution_surface(), "tool registered");
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Convenience: register a server tool.
    pub fn register_server(&mut self, tool: Arc<dyn ServerTool>) -> ValetResult<()> {
        self.register(Tool::Server(tool))
    }

    /// Convenience: register a device tool descriptor.
    pub fn register_device(&mut self, spec: DeviceToolSpec) -> ValetResult<()> {
        self.register(Tool::Device(Arc::new(spec)))
    }

    /// Record a skill manifest for prompt construction.
    pub fn register_skill(&mut self, manifest: SkillManifest) {
        debug!(skill = %manifest.name, tools = manifest.tool_names.len(), "skill registered");
        self.skills.push(manifest);
    }

    /// Read-only lookup by qualified name.
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// The execution surface for a tool name, if registered.
    pub fn surface_of(&self, name: &str) -> Option<ExecutionSurface> {
        self.tools.get(name).map(|t| t.execution_surface())
    }

    pub fn all(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    pub fn server_tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools
            .values()
            .filter(|t| t.execution_surface() == ExecutionSurface::Server)
    }

    pub fn device_tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools
            .values()
            .filter(|t| t.execution_surface() == ExecutionSurface::Device)
    }

    /// Flattened, machine-readable specs for the planner, in name order.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|t| t.spec()).collect()
    }

    pub fn skill_manifests(&self) -> &[SkillManifest] {
        &self.skills
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Enforce the `namespace.action` naming contract.
fn validate_tool_name(name: &str) -> ValetResult<()> {
    let parts: Vec<&str> = name.split('.').collect();
    let well_formed = parts.len() == 2
        && parts.iter().all(|p| {
            !p.is_empty()
                && p.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        });
    if !well_formed {
        return Err(ValetError::Config {
            reason: format!(
                "tool name '{}' is not of the form namespace.action ([a-z0-9_] only)",
                name
            ),
        });
    }
    Ok(())
}
