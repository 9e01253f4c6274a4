//! Sequence numbers in the extended window space `[0, 2·W)`.
//!
//! Unlike a free-running sequence number that wraps across the full width of
//! its integer type, [`Seq`] wraps at a fixed, small modulus: the size of the
//! extended send/receive slot arrays ([`SEQ_SPACE`](crate::config::SEQ_SPACE)).
//! This mirrors the source protocol, which indexes its packet arrays directly
//! by `seq` rather than by a generation-aware comparison.

use crate::config::SEQ_SPACE;
use crate::octs::{self, ConstEncodeSize, ReadBytes, WriteBytes};

/// A sequence number in `[0, 2·W)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Seq(pub u32);

impl Seq {
    /// Returns the current value and advances `self` by one, wrapping at
    /// [`SEQ_SPACE`].
    #[must_use]
    pub fn get_inc(&mut self) -> Self {
        let cur = *self;
        self.0 = (self.0 + 1) % SEQ_SPACE as u32;
        cur
    }

    /// Index of this sequence number into a slot array of size [`SEQ_SPACE`].
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ConstEncodeSize for Seq {
    const ENCODE_SIZE: usize = std::mem::size_of::<i32>();
}

impl octs::Encode for Seq {
    fn encode(&self, buf: &mut impl WriteBytes) -> octs::Result<()> {
        // The wire field is a 32-bit signed integer; `seq` itself never goes
        // negative since `SEQ_SPACE` is tiny.
        #[allow(clippy::cast_possible_wrap)]
        buf.write_i32(self.0 as i32)
    }
}

impl octs::Decode for Seq {
    fn decode(buf: &mut impl ReadBytes) -> octs::Result<Self> {
        #[allow(clippy::cast_sign_loss)]
        Ok(Self(buf.read_i32()? as u32))
    }
}
