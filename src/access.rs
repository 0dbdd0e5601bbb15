use axaddrspace::{device::AccessWidth, HostPhysAddr};
use axerrno::{ax_err, AxResult};

use crate::consts::*;
use crate::desc::{AddressType, PcieAddress, PcrAddress, RegDesc};
use crate::utils::*;

/// Host collaborator reading and writing chipset registers.
///
/// Every address space defaults to `Unsupported`; an implementation overrides
/// the spaces it can reach. Values are zero-extended to `u64`.
pub trait RegisterAccess {
    /// Read from the ACPI I/O block, `offset` relative to ABASE.
    fn acpi_read(&self, offset: u16, width: AccessWidth) -> AxResult<u64> {
        let _ = width;
        ax_err!(Unsupported, format_args!("ACPI I/O read at {offset:#x}"))
    }

    fn acpi_write(&self, offset: u16, width: AccessWidth, val: u64) -> AxResult {
        let _ = (width, val);
        ax_err!(Unsupported, format_args!("ACPI I/O write at {offset:#x}"))
    }

    fn gpio_read(&self, offset: u64, width: AccessWidth) -> AxResult<u64> {
        let _ = width;
        ax_err!(Unsupported, format_args!("GPIO read at {offset:#x}"))
    }

    fn gpio_write(&self, offset: u64, width: AccessWidth, val: u64) -> AxResult {
        let _ = (width, val);
        ax_err!(Unsupported, format_args!("GPIO write at {offset:#x}"))
    }

    fn mmio_read(&self, addr: HostPhysAddr, width: AccessWidth) -> AxResult<u64> {
        let _ = width;
        ax_err!(Unsupported, format_args!("MMIO read at {:#x}", addr.as_usize()))
    }

    fn mmio_write(&self, addr: HostPhysAddr, width: AccessWidth, val: u64) -> AxResult {
        let _ = (width, val);
        ax_err!(Unsupported, format_args!("MMIO write at {:#x}", addr.as_usize()))
    }

    fn pcie_read(&self, addr: PcieAddress, width: AccessWidth) -> AxResult<u64> {
        let _ = width;
        ax_err!(Unsupported, format_args!("PCI config read at {addr:?}"))
    }

    fn pcie_write(&self, addr: PcieAddress, width: AccessWidth, val: u64) -> AxResult {
        let _ = (width, val);
        ax_err!(Unsupported, format_args!("PCI config write at {addr:?}"))
    }

    fn pcr_read(&self, addr: PcrAddress, width: AccessWidth) -> AxResult<u64> {
        let _ = width;
        ax_err!(Unsupported, format_args!("PCR read at {addr:?}"))
    }

    fn pcr_write(&self, addr: PcrAddress, width: AccessWidth, val: u64) -> AxResult {
        let _ = (width, val);
        ax_err!(Unsupported, format_args!("PCR write at {addr:?}"))
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &T {
    fn acpi_read(&self, offset: u16, width: AccessWidth) -> AxResult<u64> {
        (**self).acpi_read(offset, width)
    }
    fn acpi_write(&self, offset: u16, width: AccessWidth, val: u64) -> AxResult {
        (**self).acpi_write(offset, width, val)
    }
    fn gpio_read(&self, offset: u64, width: AccessWidth) -> AxResult<u64> {
        (**self).gpio_read(offset, width)
    }
    fn gpio_write(&self, offset: u64, width: AccessWidth, val: u64) -> AxResult {
        (**self).gpio_write(offset, width, val)
    }
    fn mmio_read(&self, addr: HostPhysAddr, width: AccessWidth) -> AxResult<u64> {
        (**self).mmio_read(addr, width)
    }
    fn mmio_write(&self, addr: HostPhysAddr, width: AccessWidth, val: u64) -> AxResult {
        (**self).mmio_write(addr, width, val)
    }
    fn pcie_read(&self, addr: PcieAddress, width: AccessWidth) -> AxResult<u64> {
        (**self).pcie_read(addr, width)
    }
    fn pcie_write(&self, addr: PcieAddress, width: AccessWidth, val: u64) -> AxResult {
        (**self).pcie_write(addr, width, val)
    }
    fn pcr_read(&self, addr: PcrAddress, width: AccessWidth) -> AxResult<u64> {
        (**self).pcr_read(addr, width)
    }
    fn pcr_write(&self, addr: PcrAddress, width: AccessWidth, val: u64) -> AxResult {
        (**self).pcr_write(addr, width, val)
    }
}

/// ACPI offsets are relative to a 16-bit I/O base and must fit a port.
fn acpi_offset(reg: &RegDesc) -> AxResult<u16> {
    match u16::try_from(reg.offset) {
        Ok(offset) => Ok(offset),
        Err(_) => ax_err!(InvalidInput, format_args!("ACPI offset {:#x} out of range", reg.offset)),
    }
}

/// Read `reg` through the primitive matching its address space.
pub fn read_reg<A: RegisterAccess + ?Sized>(
    access: &A,
    reg: &RegDesc,
    width: AccessWidth,
) -> AxResult<u64> {
    let val = match reg.kind {
        AddressType::Acpi => acpi_offset(reg).and_then(|off| access.acpi_read(off, width)),
        AddressType::Gpio => access.gpio_read(reg.offset, width),
        AddressType::Mmio => access.mmio_read(HostPhysAddr::from_usize(reg.offset as usize), width),
        AddressType::Pcie => access.pcie_read(PcieAddress::from_raw(reg.offset), width),
        AddressType::Pcr => access.pcr_read(PcrAddress::from_raw(reg.offset), width),
    }
    .inspect_err(|err| error!("read of {reg:x?} failed: {err:?}"))?;
    trace!("read {reg:x?} ({width:?}) -> {val:#x}");
    Ok(truncate(val, width))
}

/// Write `val` to `reg` through the primitive matching its address space.
pub fn write_reg<A: RegisterAccess + ?Sized>(
    access: &A,
    reg: &RegDesc,
    width: AccessWidth,
    val: u64,
) -> AxResult {
    let val = truncate(val, width);
    trace!("write {reg:x?} ({width:?}) <- {val:#x}");
    match reg.kind {
        AddressType::Acpi => acpi_offset(reg).and_then(|off| access.acpi_write(off, width, val)),
        AddressType::Gpio => access.gpio_write(reg.offset, width, val),
        AddressType::Mmio => {
            access.mmio_write(HostPhysAddr::from_usize(reg.offset as usize), width, val)
        }
        AddressType::Pcie => access.pcie_write(PcieAddress::from_raw(reg.offset), width, val),
        AddressType::Pcr => access.pcr_write(PcrAddress::from_raw(reg.offset), width, val),
    }
    .inspect_err(|err| error!("write of {reg:x?} failed: {err:?}"))
}

/// Where the platform decodes the register windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformBases {
    /// ACPI I/O base (ABASE).
    pub acpi_base: u16,
    /// Sideband MMIO window.
    pub pcr_base: u64,
    /// PCIe enhanced configuration window.
    pub ecam_base: u64,
    /// Added to physical addresses to reach their mapping.
    pub phys_virt_offset: usize,
}

impl Default for PlatformBases {
    fn default() -> Self {
        Self {
            acpi_base: DEFAULT_ACPI_BASE,
            pcr_base: DEFAULT_PCR_BASE,
            ecam_base: DEFAULT_ECAM_BASE,
            phys_virt_offset: 0,
        }
    }
}

/// Register access on the real chipset.
///
/// ACPI goes through port I/O, PCI config through ECAM, and the sideband
/// through its MMIO window. GPIO is not backed.
pub struct ScRegisterAccess {
    bases: PlatformBases,
}

impl ScRegisterAccess {
    /// # Safety
    ///
    /// `bases` must describe the windows the platform actually decodes, and
    /// every window must be mapped at `phys_virt_offset` for as long as this
    /// value is used.
    pub unsafe fn new(bases: PlatformBases) -> Self {
        debug!("SC register access: {bases:x?}");
        Self { bases }
    }

    pub fn bases(&self) -> &PlatformBases {
        &self.bases
    }

    fn ecam_addr(&self, addr: PcieAddress) -> HostPhysAddr {
        let off = (addr.bus as u64) << 20
            | (addr.dev as u64) << 15
            | (addr.func as u64) << 12
            | addr.reg as u64;
        HostPhysAddr::from_usize((self.bases.ecam_base + off) as usize)
    }

    fn pcr_addr(&self, addr: PcrAddress) -> HostPhysAddr {
        HostPhysAddr::from_usize((self.bases.pcr_base + addr.raw()) as usize)
    }
}

impl RegisterAccess for ScRegisterAccess {
    fn acpi_read(&self, offset: u16, width: AccessWidth) -> AxResult<u64> {
        unsafe { perform_port_read(self.bases.acpi_base.wrapping_add(offset), width) }
    }

    fn acpi_write(&self, offset: u16, width: AccessWidth, val: u64) -> AxResult {
        unsafe { perform_port_write(self.bases.acpi_base.wrapping_add(offset), width, val) }
    }

    fn mmio_read(&self, addr: HostPhysAddr, width: AccessWidth) -> AxResult<u64> {
        Ok(unsafe { perform_mmio_read(addr, self.bases.phys_virt_offset, width) })
    }

    fn mmio_write(&self, addr: HostPhysAddr, width: AccessWidth, val: u64) -> AxResult {
        unsafe { perform_mmio_write(addr, self.bases.phys_virt_offset, width, val) };
        Ok(())
    }

    fn pcie_read(&self, addr: PcieAddress, width: AccessWidth) -> AxResult<u64> {
        self.mmio_read(self.ecam_addr(addr), width)
    }

    fn pcie_write(&self, addr: PcieAddress, width: AccessWidth, val: u64) -> AxResult {
        self.mmio_write(self.ecam_addr(addr), width, val)
    }

    fn pcr_read(&self, addr: PcrAddress, width: AccessWidth) -> AxResult<u64> {
        self.mmio_read(self.pcr_addr(addr), width)
    }

    fn pcr_write(&self, addr: PcrAddress, width: AccessWidth, val: u64) -> AxResult {
        self.mmio_write(self.pcr_addr(addr), width, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRegisters;
    use axerrno::AxError;

    struct AcpiOnly;

    impl RegisterAccess for AcpiOnly {
        fn acpi_read(&self, _offset: u16, _width: AccessWidth) -> AxResult<u64> {
            Ok(0xffff_ffff_ffff)
        }
    }

    #[test]
    fn reads_are_truncated_to_width() {
        let reg = RegDesc::new(AddressType::Acpi, R_SMI_STS);
        assert_eq!(read_reg(&AcpiOnly, &reg, AccessWidth::Word), Ok(0xffff));
    }

    #[test]
    fn acpi_offset_must_fit_a_port() {
        let reg = RegDesc::new(AddressType::Acpi, 0x1_0000 + R_SMI_STS);
        assert_eq!(read_reg(&AcpiOnly, &reg, AccessWidth::Dword), Err(AxError::InvalidInput));
        let regs = MockRegisters::new();
        assert_eq!(write_reg(&regs, &reg, AccessWidth::Dword, 1), Err(AxError::InvalidInput));
        assert!(regs.writes().is_empty());
    }

    #[test]
    fn unbacked_space_is_unsupported() {
        let reg = RegDesc::new(AddressType::Gpio, 0x10);
        assert_eq!(read_reg(&AcpiOnly, &reg, AccessWidth::Dword), Err(AxError::Unsupported));
        assert_eq!(write_reg(&AcpiOnly, &reg, AccessWidth::Dword, 1), Err(AxError::Unsupported));
    }

    #[test]
    fn composite_addresses_are_decoded_for_the_host() {
        let regs = MockRegisters::new();
        let pcr = PcrAddress::new(PID_ITSS, R_PCR_ITSS_NMICSTS);
        regs.set(AddressType::Pcr, pcr.raw(), 0x20);

        let reg = RegDesc::new(AddressType::Pcr, pcr.raw());
        assert_eq!(read_reg(&regs, &reg, AccessWidth::Dword), Ok(0x20));

        let bcr = PcieAddress::new(0, PCI_DEVICE_NUMBER_SPI, PCI_FUNCTION_NUMBER_SPI, R_SPI_BCR);
        let reg = RegDesc::new(AddressType::Pcie, bcr.raw());
        write_reg(&regs, &reg, AccessWidth::Dword, 0x2).unwrap();
        assert_eq!(regs.get(AddressType::Pcie, bcr.raw()), 0x2);
    }

    #[test]
    fn platform_access_reaches_memory_windows() {
        let mut window = [0u32; 4];
        let base = window.as_mut_ptr() as u64;
        let access = unsafe {
            ScRegisterAccess::new(PlatformBases {
                pcr_base: base,
                ..Default::default()
            })
        };
        let addr = PcrAddress::new(0, 0x8);
        access.pcr_write(addr, AccessWidth::Dword, 0xdead_beef).unwrap();
        assert_eq!(window[2], 0xdead_beef);
        assert_eq!(access.pcr_read(addr, AccessWidth::Dword), Ok(0xdead_beef));
        assert_eq!(access.gpio_read(0, AccessWidth::Dword), Err(AxError::Unsupported));
    }
}
