use axaddrspace::device::AccessWidth;
use axerrno::{ax_err, AxError, AxResult};
use bitflags::bitflags;

/// The address space a register lives in. Selects the access primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum AddressType {
    /// Port I/O, relative to the ACPI base (ABASE).
    Acpi = 0,
    /// GPIO community registers.
    Gpio = 1,
    /// Absolute memory-mapped address.
    Mmio = 2,
    /// PCI configuration space, see [`PcieAddress`].
    Pcie = 3,
    /// Sideband private configuration space, see [`PcrAddress`].
    Pcr = 4,
}

impl TryFrom<u8> for AddressType {
    type Error = AxError;

    fn try_from(raw: u8) -> AxResult<Self> {
        match raw {
            0 => Ok(Self::Acpi),
            1 => Ok(Self::Gpio),
            2 => Ok(Self::Mmio),
            3 => Ok(Self::Pcie),
            4 => Ok(Self::Pcr),
            _ => ax_err!(Unsupported, format_args!("address type tag {raw:#x}")),
        }
    }
}

/// Composite PCI config address: `bus << 24 | dev << 16 | func << 8 | reg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcieAddress {
    pub bus: u8,
    pub dev: u8,
    pub func: u8,
    pub reg: u8,
}

impl PcieAddress {
    pub const fn new(bus: u8, dev: u8, func: u8, reg: u8) -> Self {
        Self { bus, dev, func, reg }
    }

    pub const fn raw(&self) -> u64 {
        (self.bus as u64) << 24
            | (self.dev as u64) << 16
            | (self.func as u64) << 8
            | self.reg as u64
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self {
            bus: (raw >> 24) as u8,
            dev: ((raw >> 16) & 0x1f) as u8,
            func: ((raw >> 8) & 0x7) as u8,
            reg: raw as u8,
        }
    }
}

/// Composite sideband address: `pid << 16 | offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcrAddress {
    pub pid: u8,
    pub offset: u16,
}

impl PcrAddress {
    pub const fn new(pid: u8, offset: u16) -> Self {
        Self { pid, offset }
    }

    pub const fn raw(&self) -> u64 {
        (self.pid as u64) << 16 | self.offset as u64
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self {
            pid: (raw >> 16) as u8,
            offset: raw as u16,
        }
    }
}

/// A register: its address space and the offset (or composite address) in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegDesc {
    pub kind: AddressType,
    pub offset: u64,
}

impl RegDesc {
    pub const fn new(kind: AddressType, offset: u64) -> Self {
        Self { kind, offset }
    }
}

/// How a status bit is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMethod {
    /// Write the bit mask; zeros have no effect on the register.
    WriteOneToClear,
    /// The status drops as a side effect of reading a companion register.
    ReadCompanion { reg: RegDesc, width: AccessWidth },
}

/// Number of bits in a register of the given width.
pub const fn width_bits(width: AccessWidth) -> u32 {
    match width {
        AccessWidth::Byte => 8,
        AccessWidth::Word => 16,
        AccessWidth::Dword => 32,
        AccessWidth::Qword => 64,
    }
}

/// One bit of one register.
///
/// `bit < width_bits(width)` always holds: [`BitDesc::new`] rejects anything
/// else, so a malformed `static` table does not build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDesc {
    pub reg: RegDesc,
    pub width: AccessWidth,
    pub bit: u8,
    pub clear: ClearMethod,
}

impl BitDesc {
    pub const fn new(kind: AddressType, offset: u64, width: AccessWidth, bit: u8) -> Self {
        assert!((bit as u32) < width_bits(width), "bit position exceeds register width");
        Self {
            reg: RegDesc::new(kind, offset),
            width,
            bit,
            clear: ClearMethod::WriteOneToClear,
        }
    }

    /// Same bit, acknowledged by reading `reg` instead of writing one.
    pub const fn cleared_by_reading(mut self, reg: RegDesc, width: AccessWidth) -> Self {
        self.clear = ClearMethod::ReadCompanion { reg, width };
        self
    }

    #[inline]
    pub const fn mask(&self) -> u64 {
        1 << self.bit
    }
}

bitflags! {
    /// Per-source behaviour flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceFlags: u8 {
        /// The source only raises an SMI while the global SCI enable is set.
        const SCI_EN_DEPENDENT = 1 << 0;
    }
}

/// Number of enable bit slots per source.
pub const NUM_EN_BITS: usize = 2;

/// Where one logical SMI source keeps its enable and status bits.
///
/// An absent slot means "not applicable", never "event absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDesc {
    pub flags: SourceFlags,
    pub en: [Option<BitDesc>; NUM_EN_BITS],
    pub sts: Option<BitDesc>,
}

impl SourceDesc {
    /// A source with no enable and no status bit.
    pub const NULL: Self = Self {
        flags: SourceFlags::empty(),
        en: [None, None],
        sts: None,
    };

    pub const fn new(en: [Option<BitDesc>; NUM_EN_BITS], sts: Option<BitDesc>) -> Self {
        Self {
            flags: SourceFlags::empty(),
            en,
            sts,
        }
    }

    pub const fn with_flags(mut self, flags: SourceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub const fn is_null(&self) -> bool {
        self.en[0].is_none() && self.en[1].is_none() && self.sts.is_none()
    }

    pub const fn sci_en_dependent(&self) -> bool {
        self.flags.contains(SourceFlags::SCI_EN_DEPENDENT)
    }

    /// Present enable bits, first slot first.
    pub fn enable_bits(&self) -> impl Iterator<Item = &BitDesc> {
        self.en.iter().flatten()
    }
}
