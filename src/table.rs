use axaddrspace::device::AccessWidth;
use axerrno::{ax_err, AxResult};

use crate::consts::*;
#[cfg(feature = "pciesc")]
use crate::desc::PcieAddress;
use crate::desc::{AddressType, BitDesc, PcrAddress, SourceDesc, SourceFlags};

/// Primary SMI sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum IchnType {
    Mch = 0,
    Pme,
    RtcAlarm,
    RingIndicate,
    Ac97Wake,
    SerialIrq,
    Y2KRollover,
    TcoTimeout,
    OsTco,
    Nmi,
    IntruderDetect,
    BiosWp,
    McSmi,
    PmeB0,
    ThrmSts,
    IntelUsb2,
    MonSmi7,
    MonSmi6,
    MonSmi5,
    MonSmi4,
    DevTrap13,
    DevTrap12,
    DevTrap11,
    DevTrap10,
    DevTrap9,
    DevTrap8,
    DevTrap7,
    DevTrap6,
    DevTrap5,
    DevTrap3,
    DevTrap2,
    DevTrap1,
    DevTrap0,
    IoTrap3,
    IoTrap2,
    IoTrap1,
    IoTrap0,
}

pub const NUM_ICHN_TYPES: usize = IchnType::IoTrap0 as usize + 1;

impl IchnType {
    pub const ALL: [IchnType; NUM_ICHN_TYPES] = {
        use IchnType::*;
        [
            Mch, Pme, RtcAlarm, RingIndicate, Ac97Wake, SerialIrq, Y2KRollover, TcoTimeout, OsTco,
            Nmi, IntruderDetect, BiosWp, McSmi, PmeB0, ThrmSts, IntelUsb2, MonSmi7, MonSmi6,
            MonSmi5, MonSmi4, DevTrap13, DevTrap12, DevTrap11, DevTrap10, DevTrap9, DevTrap8,
            DevTrap7, DevTrap6, DevTrap5, DevTrap3, DevTrap2, DevTrap1, DevTrap0, IoTrap3, IoTrap2,
            IoTrap1, IoTrap0,
        ]
    };

    pub fn from_index(id: usize) -> AxResult<Self> {
        match Self::ALL.get(id) {
            Some(ty) => Ok(*ty),
            None => ax_err!(InvalidInput, format_args!("ichn source {id} out of range")),
        }
    }

    pub fn desc(self) -> &'static SourceDesc {
        &ICHN_SOURCE_DESCS[self as usize]
    }
}

/// Extended SMI sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum IchnExType {
    PciExpress = 0,
    /// SPI hardware-sequencing cycle done.
    SpiHw,
    /// SPI software-sequencing cycle done.
    SpiSw,
    Qrt,
    GpioUnlock,
    TmrOverflow,
}

pub const NUM_ICHN_EX_TYPES: usize = IchnExType::TmrOverflow as usize + 1;

impl IchnExType {
    pub const ALL: [IchnExType; NUM_ICHN_EX_TYPES] = {
        use IchnExType::*;
        [PciExpress, SpiHw, SpiSw, Qrt, GpioUnlock, TmrOverflow]
    };

    pub fn from_index(id: usize) -> AxResult<Self> {
        match Self::ALL.get(id) {
            Some(ty) => Ok(*ty),
            None => ax_err!(InvalidInput, format_args!("ichn-ex source {id} out of range")),
        }
    }

    pub fn desc(self) -> &'static SourceDesc {
        &ICHN_EX_SOURCE_DESCS[self as usize]
    }
}

pub const NUM_SMI_SOURCES: usize = NUM_ICHN_TYPES + NUM_ICHN_EX_TYPES;

/// Any SMI source, primary or extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SmiSource {
    Ichn(IchnType),
    IchnEx(IchnExType),
}

impl SmiSource {
    /// Index in the joined space: primary sources first, then extended.
    pub const fn index(self) -> usize {
        match self {
            Self::Ichn(ty) => ty as usize,
            Self::IchnEx(ty) => NUM_ICHN_TYPES + ty as usize,
        }
    }

    pub fn from_index(id: usize) -> AxResult<Self> {
        if id < NUM_ICHN_TYPES {
            IchnType::from_index(id).map(Self::Ichn)
        } else if id < NUM_SMI_SOURCES {
            IchnExType::from_index(id - NUM_ICHN_TYPES).map(Self::IchnEx)
        } else {
            ax_err!(InvalidInput, format_args!("smi source {id} out of range"))
        }
    }

    pub fn desc(self) -> &'static SourceDesc {
        match self {
            Self::Ichn(ty) => ty.desc(),
            Self::IchnEx(ty) => ty.desc(),
        }
    }
}

impl From<IchnType> for SmiSource {
    fn from(ty: IchnType) -> Self {
        Self::Ichn(ty)
    }
}

impl From<IchnExType> for SmiSource {
    fn from(ty: IchnExType) -> Self {
        Self::IchnEx(ty)
    }
}

/// Descriptor of primary source `id`.
pub fn lookup_ichn(id: usize) -> AxResult<&'static SourceDesc> {
    IchnType::from_index(id).map(IchnType::desc)
}

/// Descriptor of extended source `id`, counted from the first extended source.
pub fn lookup_ichn_ex(id: usize) -> AxResult<&'static SourceDesc> {
    IchnExType::from_index(id).map(IchnExType::desc)
}

/// Descriptor of source `id` in the joined index space.
pub fn lookup(id: usize) -> AxResult<&'static SourceDesc> {
    SmiSource::from_index(id).map(SmiSource::desc)
}

const fn acpi(offset: u64, width: AccessWidth, bit: u8) -> Option<BitDesc> {
    Some(BitDesc::new(AddressType::Acpi, offset, width, bit))
}

const fn smi_en(bit: u8) -> Option<BitDesc> {
    acpi(R_SMI_EN, AccessWidth::Dword, bit)
}

const fn smi_sts(bit: u8) -> Option<BitDesc> {
    acpi(R_SMI_STS, AccessWidth::Dword, bit)
}

const fn itss_nmicsts(bit: u8) -> Option<BitDesc> {
    let addr = PcrAddress::new(PID_ITSS, R_PCR_ITSS_NMICSTS);
    Some(BitDesc::new(AddressType::Pcr, addr.raw(), AccessWidth::Dword, bit))
}

const fn spibar(reg: u64, bit: u8) -> Option<BitDesc> {
    Some(BitDesc::new(AddressType::Mmio, SPI_BASE_ADDRESS | reg, AccessWidth::Dword, bit))
}

#[cfg(feature = "pciesc")]
const BIOS_WP: SourceDesc = {
    let bcr = PcieAddress::new(
        DEFAULT_PCI_BUS_NUMBER_SC,
        PCI_DEVICE_NUMBER_SPI,
        PCI_FUNCTION_NUMBER_SPI,
        R_SPI_BCR,
    );
    SourceDesc::new(
        [
            smi_en(N_SMI_EN_SPI_SSMI),
            Some(BitDesc::new(AddressType::Pcie, bcr.raw(), AccessWidth::Dword, N_SPI_BCR_BLE)),
        ],
        smi_sts(N_SMI_STS_SPI_SSMI),
    )
};

#[cfg(not(feature = "pciesc"))]
const BIOS_WP: SourceDesc = SourceDesc::NULL;

/// Primary source table, indexed by [`IchnType`].
pub static ICHN_SOURCE_DESCS: [SourceDesc; NUM_ICHN_TYPES] = {
    let mut t = [SourceDesc::NULL; NUM_ICHN_TYPES];

    t[IchnType::RtcAlarm as usize] = SourceDesc::new(
        [acpi(R_ACPI_PM1_EN, AccessWidth::Word, N_ACPI_PM1_EN_RTC), None],
        acpi(R_ACPI_PM1_STS, AccessWidth::Word, N_ACPI_PM1_STS_RTC),
    )
    .with_flags(SourceFlags::SCI_EN_DEPENDENT);

    t[IchnType::SerialIrq as usize] = SourceDesc::new([None, None], smi_sts(N_SMI_STS_SERIRQ));

    t[IchnType::TcoTimeout as usize] =
        SourceDesc::new([smi_en(N_SMI_EN_TCO), None], smi_sts(N_SMI_STS_TCO));

    t[IchnType::Nmi as usize] = SourceDesc::new(
        [smi_en(N_SMI_EN_TCO), itss_nmicsts(N_PCR_ITSS_NMI2SMIEN)],
        itss_nmicsts(N_PCR_ITSS_NMI2SMISTS),
    );

    t[IchnType::BiosWp as usize] = BIOS_WP;

    t
};

/// Extended source table, indexed by [`IchnExType`].
pub static ICHN_EX_SOURCE_DESCS: [SourceDesc; NUM_ICHN_EX_TYPES] = {
    let mut t = [SourceDesc::NULL; NUM_ICHN_EX_TYPES];

    t[IchnExType::SpiHw as usize] = SourceDesc::new(
        [smi_en(N_SMI_EN_SPI), spibar(R_SPI_HSFS, N_SPI_HSFS_FSMIE)],
        smi_sts(N_SMI_STS_SPI),
    );

    t[IchnExType::SpiSw as usize] = SourceDesc::new(
        [smi_en(N_SMI_EN_SPI), spibar(R_SPI_SSFCS, N_SPI_SSFCS_SME)],
        smi_sts(N_SMI_STS_SPI),
    );

    t[IchnExType::TmrOverflow as usize] = SourceDesc::new(
        [acpi(R_ACPI_PM1_EN, AccessWidth::Word, N_ACPI_PM1_EN_TMROF), None],
        acpi(R_ACPI_PM1_STS, AccessWidth::Word, N_ACPI_PM1_STS_TMROF),
    );

    t
};

#[cfg(test)]
mod tests {
    use super::*;
    use axerrno::AxError;

    #[test]
    fn index_spaces_are_dense() {
        assert_eq!(NUM_ICHN_TYPES, 37);
        assert_eq!(NUM_ICHN_EX_TYPES, 6);
        for (i, ty) in IchnType::ALL.iter().enumerate() {
            assert_eq!(*ty as usize, i);
        }
        for i in 0..NUM_SMI_SOURCES {
            assert_eq!(SmiSource::from_index(i).unwrap().index(), i);
        }
    }

    #[test]
    fn lookup_is_stable() {
        for i in 0..NUM_SMI_SOURCES {
            let a = lookup(i).unwrap();
            let b = lookup(i).unwrap();
            assert!(core::ptr::eq(a, b));
            assert_eq!(*a, *b);
        }
    }

    #[test]
    fn lookup_out_of_range() {
        assert_eq!(lookup(NUM_SMI_SOURCES), Err(AxError::InvalidInput));
        assert_eq!(lookup_ichn(NUM_ICHN_TYPES), Err(AxError::InvalidInput));
        assert_eq!(lookup_ichn_ex(NUM_ICHN_EX_TYPES), Err(AxError::InvalidInput));
    }

    #[test]
    fn joined_space_puts_extended_after_primary() {
        let spi = SmiSource::from_index(NUM_ICHN_TYPES + 1).unwrap();
        assert_eq!(spi, SmiSource::IchnEx(IchnExType::SpiHw));
        assert!(core::ptr::eq(lookup_ichn_ex(1).unwrap(), spi.desc()));
    }

    #[test]
    fn tco_timeout_points_at_smi_registers() {
        let desc = IchnType::TcoTimeout.desc();
        let sts = desc.sts.unwrap();
        assert_eq!(sts.reg.kind, AddressType::Acpi);
        assert_eq!(sts.reg.offset, R_SMI_STS);
        assert_eq!(sts.width, AccessWidth::Dword);
        assert_eq!(sts.bit, 13);
        assert_eq!(desc.en[0].unwrap().reg.offset, R_SMI_EN);
        assert!(desc.en[1].is_none());
        assert!(!desc.sci_en_dependent());
    }

    #[test]
    fn rtc_alarm_is_sci_gated() {
        let desc = IchnType::RtcAlarm.desc();
        assert!(desc.sci_en_dependent());
        assert_eq!(desc.sts.unwrap().width, AccessWidth::Word);
    }

    #[test]
    fn spi_sources_use_two_enable_bits() {
        let hw = IchnExType::SpiHw.desc();
        let en1 = hw.en[1].unwrap();
        assert_eq!(en1.reg.kind, AddressType::Mmio);
        assert_eq!(en1.reg.offset, SPI_BASE_ADDRESS + R_SPI_HSFS);
        assert_eq!(en1.bit, N_SPI_HSFS_FSMIE);
        assert_eq!(hw.sts, IchnExType::SpiSw.desc().sts);
    }

    #[test]
    fn nmi_status_lives_on_the_sideband() {
        let sts = IchnType::Nmi.desc().sts.unwrap();
        assert_eq!(sts.reg.kind, AddressType::Pcr);
        let addr = PcrAddress::from_raw(sts.reg.offset);
        assert_eq!(addr.pid, PID_ITSS);
        assert_eq!(addr.offset, R_PCR_ITSS_NMICSTS);
    }

    #[test]
    fn unsupported_sources_are_null() {
        for ty in [IchnType::Mch, IchnType::Y2KRollover, IchnType::IoTrap0, IchnType::DevTrap7] {
            assert!(ty.desc().is_null(), "{ty:?}");
        }
        assert!(IchnExType::GpioUnlock.desc().is_null());
    }

    #[cfg(feature = "pciesc")]
    #[test]
    fn bios_wp_reads_bios_control() {
        let en1 = IchnType::BiosWp.desc().en[1].unwrap();
        assert_eq!(en1.reg.kind, AddressType::Pcie);
        assert_eq!(PcieAddress::from_raw(en1.reg.offset).reg, R_SPI_BCR);
    }

    #[cfg(not(feature = "pciesc"))]
    #[test]
    fn bios_wp_is_null_without_pciesc() {
        assert!(IchnType::BiosWp.desc().is_null());
    }
}
