//! Directory cursor state
//!
//! A listing walks through fixed phases. The cursor keeps the phase and the
//! ordinal within it unpacked; only [`DirCursor::tell`] narrows the state to
//! the integer a caller can hold on to.

/// Bits of the consumed position exposed by `telldir`
pub const TELL_MASK: u32 = 0xFFFF;

/// Listing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Listing the root catalog (mount root only)
    RootListing,
    /// Yielding `.` and `..`
    DotFiles,
    /// Enumerating sub-keys
    SubKeys,
    /// Enumerating values
    Values,
    /// Nothing left until rewound
    Exhausted,
}

/// Position within one directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirCursor {
    at_mount_root: bool,
    phase: Phase,
    ordinal: u32,
    position: u32,
}

impl DirCursor {
    /// Creates a cursor at the start of a listing
    pub fn new(at_mount_root: bool) -> Self {
        Self {
            at_mount_root,
            phase: Self::first_phase(at_mount_root),
            ordinal: 0,
            position: 0,
        }
    }

    fn first_phase(at_mount_root: bool) -> Phase {
        if at_mount_root {
            Phase::RootListing
        } else {
            Phase::DotFiles
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ordinal of the next item within the current phase
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// Number of positions consumed since the start of the listing
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Moves past the current item
    ///
    /// Skipped items go through here too, so positions stay in step with
    /// the store's ordinals.
    pub fn advance(&mut self) {
        self.ordinal += 1;
        self.position += 1;
    }

    /// Starts `phase` at ordinal 0
    pub fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.ordinal = 0;
    }

    /// Marks the listing as finished
    pub fn finish(&mut self) {
        self.enter(Phase::Exhausted);
    }

    /// Returns to the start of the listing
    pub fn rewind(&mut self) {
        *self = Self::new(self.at_mount_root);
    }

    /// The position as exposed by `telldir`
    pub fn tell(&self) -> u32 {
        self.position & TELL_MASK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase() {
        assert_eq!(DirCursor::new(true).phase(), Phase::RootListing);
        assert_eq!(DirCursor::new(false).phase(), Phase::DotFiles);
    }

    #[test]
    fn test_positions_keep_counting_across_phases() {
        let mut cursor = DirCursor::new(false);
        cursor.advance();
        cursor.advance();
        cursor.enter(Phase::SubKeys);
        cursor.advance();
        assert_eq!(cursor.ordinal(), 1);

        cursor.enter(Phase::Values);
        assert_eq!(cursor.ordinal(), 0);
        assert_eq!(cursor.phase(), Phase::Values);
        cursor.advance();
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.tell(), 4);
    }

    #[test]
    fn test_tell_is_masked() {
        let mut cursor = DirCursor::new(false);
        for _ in 0..=TELL_MASK {
            cursor.advance();
        }
        assert_eq!(cursor.position(), TELL_MASK + 1);
        assert_eq!(cursor.tell(), 0);
    }

    #[test]
    fn test_rewind() {
        let mut cursor = DirCursor::new(true);
        cursor.advance();
        cursor.finish();
        cursor.rewind();
        assert_eq!(cursor, DirCursor::new(true));
    }
}
