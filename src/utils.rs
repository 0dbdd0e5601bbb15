use axaddrspace::{device::AccessWidth, HostPhysAddr};
use axerrno::{ax_err, AxResult};

/// Volatile read of a memory-mapped register. `virt_offset` is added to the
/// physical address to reach its mapping (zero when identity-mapped).
///
/// # Safety
///
/// `addr + virt_offset` must be a mapped register of at least `width` bytes.
pub(crate) unsafe fn perform_mmio_read(
    addr: HostPhysAddr,
    virt_offset: usize,
    width: AccessWidth,
) -> u64 {
    let addr = (addr.as_usize() + virt_offset) as *const u8;

    match width {
        AccessWidth::Byte => addr.read_volatile() as _,
        AccessWidth::Word => (addr as *const u16).read_volatile() as _,
        AccessWidth::Dword => (addr as *const u32).read_volatile() as _,
        AccessWidth::Qword => (addr as *const u64).read_volatile(),
    }
}

/// Volatile write of a memory-mapped register.
///
/// # Safety
///
/// Same as [`perform_mmio_read`].
pub(crate) unsafe fn perform_mmio_write(
    addr: HostPhysAddr,
    virt_offset: usize,
    width: AccessWidth,
    val: u64,
) {
    let addr = (addr.as_usize() + virt_offset) as *mut u8;

    match width {
        AccessWidth::Byte => addr.write_volatile(val as _),
        AccessWidth::Word => (addr as *mut u16).write_volatile(val as _),
        AccessWidth::Dword => (addr as *mut u32).write_volatile(val as _),
        AccessWidth::Qword => (addr as *mut u64).write_volatile(val),
    }
}

/// Port I/O read. Ports are at most 32 bits wide.
///
/// # Safety
///
/// Reading `port` must have no side effects the caller is not prepared for.
#[cfg(target_arch = "x86_64")]
pub(crate) unsafe fn perform_port_read(port: u16, width: AccessWidth) -> AxResult<u64> {
    use x86_64::instructions::port::Port;

    match width {
        AccessWidth::Byte => Ok(Port::<u8>::new(port).read() as _),
        AccessWidth::Word => Ok(Port::<u16>::new(port).read() as _),
        AccessWidth::Dword => Ok(Port::<u32>::new(port).read() as _),
        AccessWidth::Qword => ax_err!(Unsupported, format_args!("64-bit port read at {port:#x}")),
    }
}

/// Port I/O write. Ports are at most 32 bits wide.
///
/// # Safety
///
/// Writing `port` must be valid for the platform.
#[cfg(target_arch = "x86_64")]
pub(crate) unsafe fn perform_port_write(port: u16, width: AccessWidth, val: u64) -> AxResult {
    use x86_64::instructions::port::Port;

    match width {
        AccessWidth::Byte => Port::<u8>::new(port).write(val as _),
        AccessWidth::Word => Port::<u16>::new(port).write(val as _),
        AccessWidth::Dword => Port::<u32>::new(port).write(val as _),
        AccessWidth::Qword => {
            return ax_err!(Unsupported, format_args!("64-bit port write at {port:#x}"));
        }
    }

    Ok(())
}

#[cfg(not(target_arch = "x86_64"))]
pub(crate) unsafe fn perform_port_read(port: u16, _width: AccessWidth) -> AxResult<u64> {
    ax_err!(Unsupported, format_args!("no port I/O on this architecture ({port:#x})"))
}

#[cfg(not(target_arch = "x86_64"))]
pub(crate) unsafe fn perform_port_write(port: u16, _width: AccessWidth, _val: u64) -> AxResult {
    ax_err!(Unsupported, format_args!("no port I/O on this architecture ({port:#x})"))
}

/// Keep only the low `width` bytes of `val`.
#[inline]
pub(crate) fn truncate(val: u64, width: AccessWidth) -> u64 {
    match width {
        AccessWidth::Byte => val & 0xff,
        AccessWidth::Word => val & 0xffff,
        AccessWidth::Dword => val & 0xffff_ffff,
        AccessWidth::Qword => val,
    }
}
