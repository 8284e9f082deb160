//! Address-keyed device registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::device::Device;

/// Known devices in discovery order, at most one per address
///
/// There is no eviction; entries live as long as the owning scanner.
#[derive(Debug, Default)]
pub struct Registry {
    index: HashMap<String, usize>,
    devices: Vec<Arc<Device>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<Arc<Device>> {
        self.index
            .get(address)
            .map(|&slot| Arc::clone(&self.devices[slot]))
    }

    /// Case-insensitive lookup
    pub fn find(&self, identifier: &str) -> Option<Arc<Device>> {
        self.get(identifier).or_else(|| {
            self.devices
                .iter()
                .find(|d| d.address().eq_ignore_ascii_case(identifier))
                .cloned()
        })
    }

    /// Insert a device unless its address is already registered.
    ///
    /// Returns the registered instance, which is the existing one on conflict.
    pub fn insert(&mut self, device: Device) -> (Arc<Device>, bool) {
        if let Some(existing) = self.get(device.address()) {
            return (existing, false);
        }
        let device = Arc::new(device);
        self.index
            .insert(device.address().to_string(), self.devices.len());
        self.devices.push(Arc::clone(&device));
        (device, true)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Snapshot in discovery order
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advertisement::Advertisement;
    use crate::device::{CommandGate, DeviceVariant};
    use crate::errors::TransportError;
    use crate::frame::Frame;
    use crate::transport::CommandTransport;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct NullTransport;

    #[async_trait]
    impl CommandTransport for NullTransport {
        async fn write_command(
            &self,
            _address: &str,
            _characteristic: Uuid,
            _frame: &Frame,
        ) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn device(address: &str) -> Device {
        let adv = Advertisement::new(address).with_name("Govee_H6170_0A0B");
        Device::new(
            DeviceVariant::LedLight,
            "H6170",
            &adv,
            Arc::new(NullTransport),
            &CommandGate::new(),
        )
    }

    #[test]
    fn test_insert_is_idempotent_per_address() {
        let mut registry = Registry::new();
        let (first, inserted) = registry.insert(device("AA:00"));
        assert!(inserted);
        let (second, inserted) = registry.insert(device("AA:00"));
        assert!(!inserted);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_discovery_order_and_lookup() {
        let mut registry = Registry::new();
        registry.insert(device("CC:00"));
        registry.insert(device("AA:00"));
        registry.insert(device("BB:00"));

        let order: Vec<String> = registry
            .devices()
            .iter()
            .map(|d| d.address().to_string())
            .collect();
        assert_eq!(order, vec!["CC:00", "AA:00", "BB:00"]);

        assert!(registry.contains("AA:00"));
        assert!(registry.get("aa:00").is_none());
        assert_eq!(registry.find("aa:00").unwrap().address(), "AA:00");
    }
}
