//! Module registry - what the run knows about each module on the bus

use std::collections::BTreeMap;

use j1939_packets::messages::{Dm20MonitorPerformanceRatio, Dm5DiagnosticReadiness, EngineHours, IdleOperation};
use j1939_packets::{address_name, DiagnosticMessage, ResettableCounter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::comms::CommunicationsModule;
use crate::error::GatewayResult;

/// Counter values recorded before a clear, used to tell whether it reset them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterBaselines {
    #[serde(default)]
    pub ignition_cycles: Option<u32>,
    #[serde(default)]
    pub engine_hours_raw: Option<u32>,
    #[serde(default)]
    pub idle_hours_raw: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub address: u8,
    /// Function code claimed by the module
    #[serde(default)]
    pub function: u8,
    #[serde(default)]
    pub obd: bool,
    #[serde(default)]
    pub baselines: CounterBaselines,
}

impl ModuleInfo {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            function: 0,
            obd: false,
            baselines: CounterBaselines::default(),
        }
    }

    pub fn obd(address: u8) -> Self {
        Self {
            obd: true,
            ..Self::new(address)
        }
    }

    pub fn name(&self) -> String {
        address_name(self.address)
    }
}

/// Per-run module context. Built once before the steps run and passed to
/// them read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRegistry {
    modules: BTreeMap<u8, ModuleInfo>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_modules(modules: impl IntoIterator<Item = ModuleInfo>) -> Self {
        let mut registry = Self::new();
        for module in modules {
            registry.insert(module);
        }
        registry
    }

    /// Add or replace the entry for `module.address`
    pub fn insert(&mut self, module: ModuleInfo) {
        self.modules.insert(module.address, module);
    }

    pub fn with_module(mut self, module: ModuleInfo) -> Self {
        self.insert(module);
        self
    }

    pub fn module(&self, address: u8) -> Option<&ModuleInfo> {
        self.modules.get(&address)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values()
    }

    /// OBD module addresses, ascending
    pub fn obd_addresses(&self) -> Vec<u8> {
        self.modules.values().filter(|m| m.obd).map(|m| m.address).collect()
    }

    pub fn is_obd_module(&self, address: u8) -> bool {
        self.modules.get(&address).is_some_and(|m| m.obd)
    }

    pub fn baselines(&self, address: u8) -> CounterBaselines {
        self.modules.get(&address).map(|m| m.baselines).unwrap_or_default()
    }

    /// Build the registry from the bus: every module answering a global DM5
    /// is registered, OBD capability comes from its compliance byte, and the
    /// OBD modules' run-time counters are recorded as baselines.
    pub async fn discover(comms: &CommunicationsModule) -> GatewayResult<Self> {
        let mut registry = Self::new();

        let dm5 = comms.request_global::<Dm5DiagnosticReadiness>().await?;
        for packet in &dm5.packets {
            let mut module = ModuleInfo::new(packet.source_address());
            module.obd = packet.is_obd();
            debug!(address = module.address, obd = module.obd, "Discovered module");
            registry.insert(module);
        }

        for address in registry.obd_addresses() {
            let baselines = CounterBaselines {
                ignition_cycles: comms
                    .request_directed::<Dm20MonitorPerformanceRatio>(address)
                    .await?
                    .packet()
                    .and_then(|p| p.counter()),
                engine_hours_raw: comms
                    .request_directed::<EngineHours>(address)
                    .await?
                    .packet()
                    .and_then(|p| p.counter()),
                idle_hours_raw: comms
                    .request_directed::<IdleOperation>(address)
                    .await?
                    .packet()
                    .and_then(|p| p.counter()),
            };
            if let Some(module) = registry.modules.get_mut(&address) {
                module.baselines = baselines;
            }
        }

        info!(
            modules = registry.modules.len(),
            obd = registry.obd_addresses().len(),
            "Module discovery complete"
        );
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obd_addresses_ascending() {
        let registry = ModuleRegistry::new()
            .with_module(ModuleInfo::obd(0x3D))
            .with_module(ModuleInfo::new(0x17))
            .with_module(ModuleInfo::obd(0x00));

        assert_eq!(registry.obd_addresses(), vec![0x00, 0x3D]);
        assert!(registry.is_obd_module(0x3D));
        assert!(!registry.is_obd_module(0x17));
        assert!(!registry.is_obd_module(0x01));
    }

    #[test]
    fn test_baselines_default_when_unknown() {
        let mut module = ModuleInfo::obd(0);
        module.baselines.engine_hours_raw = Some(2000);
        let registry = ModuleRegistry::from_modules([module]);

        assert_eq!(registry.baselines(0).engine_hours_raw, Some(2000));
        assert_eq!(registry.baselines(9), CounterBaselines::default());
    }
}
