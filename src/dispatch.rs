use axerrno::{ax_err, AxResult};
use bitmaps::Bitmap;
use spin::Mutex;

use crate::access::RegisterAccess;
use crate::desc::BitDesc;
use crate::table::{SmiSource, NUM_SMI_SOURCES};
use crate::SmiSourceResolver;

/// Called with the source that raised the SMI.
pub type SmiHandler = fn(SmiSource);

pub struct SmiDispatcher<A, S = fn(&A) -> AxResult<bool>> {
    resolver: SmiSourceResolver<A, S>,
    /// Sources with a handler, by joined index.
    registered: Mutex<Bitmap<{ NUM_SMI_SOURCES }>>,
    handlers: Mutex<[Option<SmiHandler>; NUM_SMI_SOURCES]>,
}

impl<A: RegisterAccess, S: Fn(&A) -> AxResult<bool>> SmiDispatcher<A, S> {
    pub fn new(resolver: SmiSourceResolver<A, S>) -> Self {
        Self {
            resolver,
            registered: Mutex::new(Bitmap::new()),
            handlers: Mutex::new([None; NUM_SMI_SOURCES]),
        }
    }

    pub fn resolver(&self) -> &SmiSourceResolver<A, S> {
        &self.resolver
    }

    pub fn is_registered(&self, source: SmiSource) -> bool {
        self.registered.lock().get(source.index())
    }

    /// Install `handler` for `source` and arm the source. If arming fails the
    /// source is left unregistered.
    pub fn register(&self, source: SmiSource, handler: SmiHandler) -> AxResult {
        let desc = source.desc();
        if desc.sts.is_none() {
            return ax_err!(InvalidInput, format_args!("{source:?} has no status bit"));
        }
        let idx = source.index();
        {
            let mut registered = self.registered.lock();
            if registered.get(idx) {
                return ax_err!(AlreadyExists, format_args!("{source:?}"));
            }
            registered.set(idx, true);
            self.handlers.lock()[idx] = Some(handler);
        }

        // Clear stale status before arming so the first dispatch is genuine.
        let armed = self
            .resolver
            .clear_source(desc)
            .and_then(|_| self.resolver.enable_source(desc));
        if let Err(err) = armed {
            warn!("SMI source {source:?} not armed: {err:?}");
            self.registered.lock().set(idx, false);
            self.handlers.lock()[idx] = None;
            return Err(err);
        }
        debug!("SMI source {source:?} registered");
        Ok(())
    }

    /// Remove the handler of `source` and disarm it. Enable bits shared with
    /// another registered source stay set. An SCI_EN dependent source is not
    /// disarmed while SCI is disabled and keeps its enable bits.
    pub fn unregister(&self, source: SmiSource) -> AxResult {
        let idx = source.index();
        let others = {
            let mut registered = self.registered.lock();
            if !registered.get(idx) {
                return ax_err!(NotFound, format_args!("{source:?} is not registered"));
            }
            registered.set(idx, false);
            self.handlers.lock()[idx] = None;
            registered.clone()
        };
        debug!("SMI source {source:?} unregistered");

        let desc = source.desc();
        if self.resolver.gated_off(desc)? {
            debug!("disarm skipped, SCI disabled: {source:?}");
            return Ok(());
        }
        for en in desc.enable_bits() {
            if !Self::shared(en, &others) {
                self.resolver.set_enable(Some(en), false)?;
            }
        }
        Ok(())
    }

    fn shared(en: &BitDesc, registered: &Bitmap<{ NUM_SMI_SOURCES }>) -> bool {
        registered.into_iter().any(|idx| {
            SmiSource::from_index(idx)
                .map(|other| other.desc().enable_bits().any(|e| e == en))
                .unwrap_or(false)
        })
    }

    /// Service every registered source that is signaling: all active sources
    /// are found first, then their handlers run, then their status is cleared.
    /// Sources sharing a status bit are all serviced by one SMI.
    ///
    /// Returns the number of sources serviced.
    pub fn dispatch(&self) -> AxResult<usize> {
        let registered = self.registered.lock().clone();
        let handlers = *self.handlers.lock();

        let mut active = Bitmap::<{ NUM_SMI_SOURCES }>::new();
        for idx in &registered {
            let source = SmiSource::from_index(idx)?;
            if self.resolver.source_is_active(source.desc())? {
                active.set(idx, true);
            }
        }

        for idx in &active {
            let source = SmiSource::from_index(idx)?;
            trace!("SMI from {source:?}");
            if let Some(handler) = handlers[idx] {
                handler(source);
            }
        }

        for idx in &active {
            self.resolver.clear_source(SmiSource::from_index(idx)?.desc())?;
        }

        let count = active.len();
        if count > 0 {
            debug!("dispatched {count} SMI source(s)");
        }
        Ok(count)
    }
}
