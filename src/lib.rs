#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

mod access;
mod consts;
mod desc;
mod dispatch;
mod table;
mod utils;

#[cfg(test)]
mod mock;

pub use access::*;
pub use consts::*;
pub use desc::*;
pub use dispatch::*;
pub use table::*;

use axaddrspace::device::AccessWidth;
use axerrno::AxResult;

/// Default global SCI query: PM1_CNT.SCI_EN in the ACPI block.
pub fn acpi_sci_enabled<A: RegisterAccess>(access: &A) -> AxResult<bool> {
    let reg = RegDesc::new(AddressType::Acpi, R_ACPI_PM1_CNT);
    let val = read_reg(access, &reg, AccessWidth::Dword)?;
    Ok(val & (1 << N_ACPI_PM1_CNT_SCI_EN) != 0)
}

/// Observable state of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceState {
    /// Every present enable bit is set.
    pub armed: bool,
    /// The status bit is set and the source is not gated off.
    pub signaling: bool,
}

pub struct SmiSourceResolver<A, S = fn(&A) -> AxResult<bool>> {
    access: A,
    sci_enabled: S,
}

impl<A: RegisterAccess> SmiSourceResolver<A> {
    /// Resolver reading the global SCI enable from PM1_CNT.
    pub fn new(access: A) -> Self {
        Self {
            access,
            sci_enabled: acpi_sci_enabled::<A>,
        }
    }
}

impl<A: RegisterAccess, S: Fn(&A) -> AxResult<bool>> SmiSourceResolver<A, S> {
    /// Resolver with a caller supplied SCI enable query.
    pub fn with_sci_query(access: A, sci_enabled: S) -> Self {
        Self {
            access,
            sci_enabled,
        }
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn sci_enabled(&self) -> AxResult<bool> {
        (self.sci_enabled)(&self.access)
    }

    /// Whether the bit is set. An absent bit is never active.
    pub fn is_active(&self, desc: Option<&BitDesc>) -> AxResult<bool> {
        let Some(desc) = desc else {
            return Ok(false);
        };
        let val = read_reg(&self.access, &desc.reg, desc.width)?;
        Ok(val & desc.mask() != 0)
    }

    /// Acknowledge a status bit. An absent bit is a no-op.
    pub fn clear(&self, desc: Option<&BitDesc>) -> AxResult {
        let Some(desc) = desc else {
            return Ok(());
        };
        match desc.clear {
            // Zeros are ignored by the register, so only our bit is touched.
            ClearMethod::WriteOneToClear => {
                write_reg(&self.access, &desc.reg, desc.width, desc.mask())
            }
            ClearMethod::ReadCompanion { reg, width } => {
                read_reg(&self.access, &reg, width)?;
                Ok(())
            }
        }
    }

    /// Set or clear an enable bit, preserving the rest of the register.
    /// An absent bit is a no-op.
    pub fn set_enable(&self, desc: Option<&BitDesc>, enabled: bool) -> AxResult {
        let Some(desc) = desc else {
            return Ok(());
        };
        let old = read_reg(&self.access, &desc.reg, desc.width)?;
        let new = if enabled {
            old | desc.mask()
        } else {
            old & !desc.mask()
        };
        write_reg(&self.access, &desc.reg, desc.width, new)
    }

    /// SCI_EN dependent sources are inert while the global SCI enable is off.
    /// A failed SCI query is an error, not a closed gate.
    pub(crate) fn gated_off(&self, src: &SourceDesc) -> AxResult<bool> {
        Ok(src.sci_en_dependent() && !self.sci_enabled()?)
    }

    /// Whether every present enable bit is set. A source with no enable bit
    /// cannot be armed.
    pub fn source_is_enabled(&self, src: &SourceDesc) -> AxResult<bool> {
        let mut any = false;
        for en in src.enable_bits() {
            if !self.is_active(Some(en))? {
                return Ok(false);
            }
            any = true;
        }
        Ok(any)
    }

    /// Whether the source is armed and its status bit is set.
    pub fn source_is_active(&self, src: &SourceDesc) -> AxResult<bool> {
        if self.gated_off(src)? {
            return Ok(false);
        }
        for en in src.enable_bits() {
            if !self.is_active(Some(en))? {
                return Ok(false);
            }
        }
        self.is_active(src.sts.as_ref())
    }

    pub fn clear_source(&self, src: &SourceDesc) -> AxResult {
        if self.gated_off(src)? {
            debug!("clear skipped, SCI disabled: {src:x?}");
            return Ok(());
        }
        self.clear(src.sts.as_ref())
    }

    /// Write every present enable bit, first slot first. A failure between the
    /// two writes leaves the source partially armed.
    pub fn set_source_enable(&self, src: &SourceDesc, enabled: bool) -> AxResult {
        if self.gated_off(src)? {
            debug!("enable={enabled} skipped, SCI disabled: {src:x?}");
            return Ok(());
        }
        for en in src.enable_bits() {
            self.set_enable(Some(en), enabled)?;
        }
        Ok(())
    }

    pub fn enable_source(&self, src: &SourceDesc) -> AxResult {
        self.set_source_enable(src, true)
    }

    pub fn disable_source(&self, src: &SourceDesc) -> AxResult {
        self.set_source_enable(src, false)
    }

    pub fn source_state(&self, src: &SourceDesc) -> AxResult<SourceState> {
        Ok(SourceState {
            armed: self.source_is_enabled(src)?,
            signaling: !self.gated_off(src)? && self.is_active(src.sts.as_ref())?,
        })
    }
}
