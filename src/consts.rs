// Register locations referenced by the Broxton SC SMI source tables.
// Only the registers the tables point at are carried here.

// --- ACPI I/O block (relative to ABASE) ---

/// Power Management 1 Status.
pub const R_ACPI_PM1_STS: u64 = 0x00;
pub const N_ACPI_PM1_STS_RTC: u8 = 10;
pub const N_ACPI_PM1_STS_TMROF: u8 = 0;

/// Power Management 1 Enables.
pub const R_ACPI_PM1_EN: u64 = 0x02;
pub const N_ACPI_PM1_EN_RTC: u8 = 10;
pub const N_ACPI_PM1_EN_TMROF: u8 = 0;

/// Power Management 1 Control. Bit 0 is the global SCI enable.
pub const R_ACPI_PM1_CNT: u64 = 0x04;
pub const N_ACPI_PM1_CNT_SCI_EN: u8 = 0;

/// SMI Control and Enable.
#[cfg(feature = "enbdt-pf")]
pub const R_SMI_EN: u64 = 0x40;
/// SMI Control and Enable.
#[cfg(not(feature = "enbdt-pf"))]
pub const R_SMI_EN: u64 = 0x30;

pub const N_SMI_EN_SPI: u8 = 26;
pub const N_SMI_EN_SPI_SSMI: u8 = 25;
pub const N_SMI_EN_TCO: u8 = 13;

/// SMI Status.
#[cfg(feature = "enbdt-pf")]
pub const R_SMI_STS: u64 = 0x44;
/// SMI Status.
#[cfg(not(feature = "enbdt-pf"))]
pub const R_SMI_STS: u64 = 0x34;

pub const N_SMI_STS_SPI: u8 = 26;
pub const N_SMI_STS_SPI_SSMI: u8 = 25;
pub const N_SMI_STS_SERIRQ: u8 = 15;
pub const N_SMI_STS_TCO: u8 = 13;

// --- SPI controller (D13:F2) ---

pub const DEFAULT_PCI_BUS_NUMBER_SC: u8 = 0;
pub const PCI_DEVICE_NUMBER_SPI: u8 = 13;
pub const PCI_FUNCTION_NUMBER_SPI: u8 = 2;

/// SPI BAR0 the firmware programs before handing off.
pub const SPI_BASE_ADDRESS: u64 = 0xFED0_1000;

/// BIOS Control, in the SPI function's PCI config space.
pub const R_SPI_BCR: u8 = 0xDC;
/// BIOS Lock Enable.
pub const N_SPI_BCR_BLE: u8 = 1;

/// Hardware Sequencing Flash Status and Control (HSFS + HSFC as one dword).
pub const R_SPI_HSFS: u64 = 0x04;
/// Flash SPI SMI# Enable, HSFC bit 15 seen through the dword.
pub const N_SPI_HSFS_FSMIE: u8 = 31;

/// Software Sequencing Flash Control and Status.
pub const R_SPI_SSFCS: u64 = 0xA0;
/// SPI SMI# Enable.
pub const N_SPI_SSFCS_SME: u8 = 23;

// --- Sideband (PCR) ---

/// Port ID of the interrupt and timer subsystem (ITSS).
pub const PID_ITSS: u8 = 0xD0;
/// ITSS NMI control and status.
pub const R_PCR_ITSS_NMICSTS: u16 = 0x3330;
pub const N_PCR_ITSS_NMI2SMIEN: u8 = 6;
pub const N_PCR_ITSS_NMI2SMISTS: u8 = 5;

// --- Platform defaults ---

/// Default ACPI I/O base (ABASE).
pub const DEFAULT_ACPI_BASE: u16 = 0x400;
/// Default base of the sideband MMIO window.
pub const DEFAULT_PCR_BASE: u64 = 0xD000_0000;
/// Default base of the PCIe enhanced configuration window.
pub const DEFAULT_ECAM_BASE: u64 = 0xE000_0000;
