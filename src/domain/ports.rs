use std::collections::BTreeMap;

/// What the hub reported on a port, plus the mode we configured it to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedDevice {
    pub device_type: u8,
    pub mode: Option<u8>,
}

impl AttachedDevice {
    pub fn new(device_type: u8) -> Self {
        Self {
            device_type,
            mode: None,
        }
    }
}

/// Devices currently attached to the hub, keyed by port index.
///
/// Only the owning session mutates this. Attaching to an occupied port replaces
/// the previous entry.
#[derive(Debug, Clone, Default)]
pub struct PortTable {
    entries: BTreeMap<u8, AttachedDevice>,
}

impl PortTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the device that was replaced, if any
    pub fn attach(&mut self, port: u8, device_type: u8) -> Option<AttachedDevice> {
        self.entries.insert(port, AttachedDevice::new(device_type))
    }

    pub fn detach(&mut self, port: u8) -> Option<AttachedDevice> {
        self.entries.remove(&port)
    }

    pub fn lookup(&self, port: u8) -> Option<&AttachedDevice> {
        self.entries.get(&port)
    }

    pub fn device_type(&self, port: u8) -> Option<u8> {
        self.entries.get(&port).map(|d| d.device_type)
    }

    /// Records the configured mode; false if nothing is attached to the port
    pub fn set_mode(&mut self, port: u8, mode: u8) -> bool {
        match self.entries.get_mut(&port) {
            Some(device) => {
                device.mode = Some(mode);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &AttachedDevice)> {
        self.entries.iter().map(|(port, device)| (*port, device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_then_detach() {
        let mut table = PortTable::new();
        table.attach(2, 0x01);
        assert_eq!(table.lookup(2), Some(&AttachedDevice::new(0x01)));

        assert_eq!(table.detach(2), Some(AttachedDevice::new(0x01)));
        assert_eq!(table.lookup(2), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_attach_replaces_silently() {
        let mut table = PortTable::new();
        table.attach(1, 0x25);
        table.set_mode(1, 8);

        let previous = table.attach(1, 0x26);
        assert_eq!(
            previous,
            Some(AttachedDevice {
                device_type: 0x25,
                mode: Some(8)
            })
        );
        // the new device starts without a configured mode
        assert_eq!(table.lookup(1), Some(&AttachedDevice::new(0x26)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_set_mode_requires_device() {
        let mut table = PortTable::new();
        assert!(!table.set_mode(0, 2));

        table.attach(0, 0x26);
        assert!(table.set_mode(0, 2));
        assert_eq!(table.lookup(0).and_then(|d| d.mode), Some(2));
    }

    #[test]
    fn test_detach_unknown_port_is_noop() {
        let mut table = PortTable::new();
        table.attach(3, 0x28);
        assert_eq!(table.detach(5), None);
        assert_eq!(table.device_type(3), Some(0x28));
    }
}
