//! Procedure attribute flags.

use bitflags::bitflags;

bitflags! {
    /// Attributes recorded on a procedure's metadata.
    ///
    /// ```
    /// use dmc_core::ProcFlags;
    ///
    /// let flags = ProcFlags::VERB | ProcFlags::UNIMPLEMENTED;
    /// assert!(flags.contains(ProcFlags::VERB));
    /// assert!(!flags.is_override());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProcFlags: u8 {
        /// The proc redefines a same-named proc visible through the parent chain.
        /// Set by the object tree when the proc is registered, never by callers.
        const OVERRIDE = 1 << 0;
        /// The proc exists for compatibility but has no runtime implementation.
        const UNIMPLEMENTED = 1 << 1;
        /// The proc is a verb (player-invocable).
        const VERB = 1 << 2;
    }
}

impl ProcFlags {
    #[inline]
    pub fn is_override(self) -> bool {
        self.contains(ProcFlags::OVERRIDE)
    }

    #[inline]
    pub fn is_unimplemented(self) -> bool {
        self.contains(ProcFlags::UNIMPLEMENTED)
    }
}
