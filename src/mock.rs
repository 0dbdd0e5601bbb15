use std::collections::BTreeMap;

use axaddrspace::{device::AccessWidth, HostPhysAddr};
use axerrno::AxResult;
use spin::Mutex;

use crate::access::RegisterAccess;
use crate::desc::{AddressType, PcieAddress, PcrAddress};

type Key = (AddressType, u64);

#[derive(Default)]
struct Inner {
    regs: BTreeMap<Key, u64>,
    /// Registers where writing a one clears the bit.
    w1c: Vec<Key>,
    /// Reading the key clears `mask` in the target register.
    read_clears: BTreeMap<Key, (Key, u64)>,
    writes: Vec<(Key, u64)>,
}

/// Register file keyed by address space and offset. Unknown registers read 0.
/// GPIO is left unbacked.
#[derive(Default)]
pub struct MockRegisters {
    inner: Mutex<Inner>,
}

impl MockRegisters {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    pub fn set(&self, kind: AddressType, offset: u64, val: u64) {
        self.inner.lock().regs.insert((kind, offset), val);
    }

    pub fn get(&self, kind: AddressType, offset: u64) -> u64 {
        self.inner.lock().regs.get(&(kind, offset)).copied().unwrap_or(0)
    }

    pub fn write_one_to_clear(&self, kind: AddressType, offset: u64) {
        self.inner.lock().w1c.push((kind, offset));
    }

    pub fn clear_on_read(&self, companion: Key, target: Key, mask: u64) {
        self.inner.lock().read_clears.insert(companion, (target, mask));
    }

    /// Every write so far, in order.
    pub fn writes(&self) -> Vec<(Key, u64)> {
        self.inner.lock().writes.clone()
    }

    fn load(&self, key: Key) -> u64 {
        let mut inner = self.inner.lock();
        let val = inner.regs.get(&key).copied().unwrap_or(0);
        if let Some((target, mask)) = inner.read_clears.get(&key).copied() {
            if let Some(reg) = inner.regs.get_mut(&target) {
                *reg &= !mask;
            }
        }
        val
    }

    fn store(&self, key: Key, val: u64) {
        let mut inner = self.inner.lock();
        inner.writes.push((key, val));
        let w1c = inner.w1c.contains(&key);
        let reg = inner.regs.entry(key).or_insert(0);
        if w1c {
            *reg &= !val;
        } else {
            *reg = val;
        }
    }
}

impl RegisterAccess for MockRegisters {
    fn acpi_read(&self, offset: u16, _width: AccessWidth) -> AxResult<u64> {
        Ok(self.load((AddressType::Acpi, offset as u64)))
    }

    fn acpi_write(&self, offset: u16, _width: AccessWidth, val: u64) -> AxResult {
        self.store((AddressType::Acpi, offset as u64), val);
        Ok(())
    }

    fn mmio_read(&self, addr: HostPhysAddr, _width: AccessWidth) -> AxResult<u64> {
        Ok(self.load((AddressType::Mmio, addr.as_usize() as u64)))
    }

    fn mmio_write(&self, addr: HostPhysAddr, _width: AccessWidth, val: u64) -> AxResult {
        self.store((AddressType::Mmio, addr.as_usize() as u64), val);
        Ok(())
    }

    fn pcie_read(&self, addr: PcieAddress, _width: AccessWidth) -> AxResult<u64> {
        Ok(self.load((AddressType::Pcie, addr.raw())))
    }

    fn pcie_write(&self, addr: PcieAddress, _width: AccessWidth, val: u64) -> AxResult {
        self.store((AddressType::Pcie, addr.raw()), val);
        Ok(())
    }

    fn pcr_read(&self, addr: PcrAddress, _width: AccessWidth) -> AxResult<u64> {
        Ok(self.load((AddressType::Pcr, addr.raw())))
    }

    fn pcr_write(&self, addr: PcrAddress, _width: AccessWidth, val: u64) -> AxResult {
        self.store((AddressType::Pcr, addr.raw()), val);
        Ok(())
    }
}
