//! Capability policy handed to the engine for each transformation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Allow,
    Forbid,
}

/// Side effects a stylesheet can request through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ReadFile,
    WriteFile,
    CreateDirectory,
    ReadNetwork,
    WriteNetwork,
}

/// Per-capability access decisions.
///
/// The default forbids every write. Reads stay allowed because imports and
/// `document()` calls are served by the fetch bridge, which is itself
/// subject to the host's same-origin rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPolicy {
    pub read_file: Access,
    pub write_file: Access,
    pub create_directory: Access,
    pub read_network: Access,
    pub write_network: Access,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            read_file: Access::Allow,
            write_file: Access::Forbid,
            create_directory: Access::Forbid,
            read_network: Access::Allow,
            write_network: Access::Forbid,
        }
    }
}

impl SecurityPolicy {
    /// A policy that forbids every capability.
    pub fn locked_down() -> Self {
        Self {
            read_file: Access::Forbid,
            write_file: Access::Forbid,
            create_directory: Access::Forbid,
            read_network: Access::Forbid,
            write_network: Access::Forbid,
        }
    }

    pub fn access(&self, capability: Capability) -> Access {
        match capability {
            Capability::ReadFile => self.read_file,
            Capability::WriteFile => self.write_file,
            Capability::CreateDirectory => self.create_directory,
            Capability::ReadNetwork => self.read_network,
            Capability::WriteNetwork => self.write_network,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.access(capability) == Access::Allow
    }

    pub fn set(mut self, capability: Capability, access: Access) -> Self {
        let slot = match capability {
            Capability::ReadFile => &mut self.read_file,
            Capability::WriteFile => &mut self.write_file,
            Capability::CreateDirectory => &mut self.create_directory,
            Capability::ReadNetwork => &mut self.read_network,
            Capability::WriteNetwork => &mut self.write_network,
        };
        *slot = access;
        self
    }

    /// The read capability needed to load `uri`, judged by its scheme.
    /// URIs without a scheme are treated as local paths.
    pub fn read_capability_for(uri: &str) -> Capability {
        match uri.split_once(':') {
            Some((scheme, _))
                if scheme.len() > 1
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
            {
                if scheme.eq_ignore_ascii_case("file") {
                    Capability::ReadFile
                } else {
                    Capability::ReadNetwork
                }
            }
            _ => Capability::ReadFile,
        }
    }
}
