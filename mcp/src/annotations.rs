//! Tool behavior hints advertised to MCP clients.
//!
//! We keep [`ToolAnnotations`] as plain `bool`s and convert to
//! [`rmcp::model::ToolAnnotations`] (all `Option<bool>`) only when a descriptor
//! is published. The default is conservative: destructive and open-world.

use rmcp::model::ToolAnnotations as RmcpToolAnnotations;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAnnotations {
    pub read_only: bool,
    pub destructive: bool,
    pub idempotent: bool,
    pub open_world: bool,
}

impl Default for ToolAnnotations {
    fn default() -> Self {
        Self {
            read_only: false,
            destructive: true,
            idempotent: false,
            open_world: true,
        }
    }
}

impl ToolAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only tools never modify backend state.
    pub fn read_only() -> Self {
        Self::default()
            .with_read_only(true)
            .with_destructive(false)
            .with_idempotent(true)
    }

    #[must_use]
    pub fn with_read_only(mut self, v: bool) -> Self {
        self.read_only = v;
        self
    }

    #[must_use]
    pub fn with_destructive(mut self, v: bool) -> Self {
        self.destructive = v;
        self
    }

    #[must_use]
    pub fn with_idempotent(mut self, v: bool) -> Self {
        self.idempotent = v;
        self
    }

    #[must_use]
    pub fn with_open_world(mut self, v: bool) -> Self {
        self.open_world = v;
        self
    }

    pub fn to_rmcp(&self, title: Option<&str>) -> RmcpToolAnnotations {
        RmcpToolAnnotations {
            title: title.map(str::to_string),
            read_only_hint: Some(self.read_only),
            // Destructive/idempotent hints are only meaningful for tools that write.
            destructive_hint: (!self.read_only).then_some(self.destructive),
            idempotent_hint: (!self.read_only).then_some(self.idempotent),
            open_world_hint: Some(self.open_world),
        }
    }
}
