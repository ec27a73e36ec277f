//! Bitstreams: the only way generators obtain entropy.
//!
//! A [`RandomBitStream`] produces fresh entropy from a seeded PRNG. A
//! [`BufBitStream`] replays a previously recorded (and possibly pruned)
//! buffer. Both log what they hand out to a [`Recorder`], so recording,
//! grouping and pruning work the same regardless of where the words come
//! from.

use crate::{data::*, error::*, prng::*, recorder::*};

/// Sequential entropy source with nestable groups.
pub trait BitStream {
    /// Draw the next `n` bits, `0 <= n <= 64`, as a value below `2^n`.
    ///
    /// An error ends the attempt: groups opened around the failing draw
    /// stay open, so the stream must not be drawn from again.
    ///
    /// # Panics
    ///
    /// Panics if `n > 64`.
    fn draw_bits(&mut self, n: u32) -> Result<u64>;

    /// Open a group that spans every draw until the matching `end_group`.
    fn begin_group(&mut self, label: &str, removable: bool) -> GroupHandle;

    /// Close a group. `discard` marks the group's entropy as wasted so the
    /// next prune deletes it.
    fn end_group(&mut self, handle: GroupHandle, discard: bool);
}

/// Mask selecting the low `n` bits of a word.
#[inline]
pub fn bit_mask(n: u32) -> u64 {
    assert!(n <= 64, "cannot draw {n} bits, at most 64 are available");
    if n == 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

/// Bitstream backed by a [`Jsf64`] generator. Never runs out.
#[derive(Debug, Clone)]
pub struct RandomBitStream {
    seed: Seed,
    rng: Jsf64,
    recorder: Recorder,
}

impl RandomBitStream {
    /// Create a stream from an explicit seed.
    pub fn new(seed: impl Into<Seed>, persist: bool) -> Self {
        let seed = seed.into();
        RandomBitStream {
            seed,
            rng: Jsf64::new(seed.get()),
            recorder: Recorder::new(persist),
        }
    }

    /// Create a stream with a freshly derived unique seed.
    pub fn random(persist: bool) -> Self {
        RandomBitStream::new(Seed::random(), persist)
    }

    /// Seed this stream was built from.
    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// Recording of everything drawn so far.
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Consume the stream, keeping its recording.
    pub fn into_recorder(self) -> Recorder {
        self.recorder
    }
}

impl BitStream for RandomBitStream {
    fn draw_bits(&mut self, n: u32) -> Result<u64> {
        let mask = bit_mask(n);
        let word = self.rng.step() & mask;
        self.recorder.record(word);
        Ok(word)
    }

    fn begin_group(&mut self, label: &str, removable: bool) -> GroupHandle {
        self.recorder.begin_group(label, removable)
    }

    fn end_group(&mut self, handle: GroupHandle, discard: bool) {
        self.recorder.end_group(handle, discard)
    }
}

/// Bitstream replaying a fixed buffer of words.
#[derive(Debug, Clone)]
pub struct BufBitStream {
    buf: Vec<u64>,
    pos: usize,
    recorder: Recorder,
}

impl BufBitStream {
    /// Create a stream replaying `buf` from the start.
    pub fn new(buf: Vec<u64>, persist: bool) -> Self {
        BufBitStream {
            buf,
            pos: 0,
            recorder: Recorder::new(persist),
        }
    }

    /// Number of words left to replay.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Recording of everything drawn so far.
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Consume the stream, keeping its recording.
    pub fn into_recorder(self) -> Recorder {
        self.recorder
    }
}

impl BitStream for BufBitStream {
    fn draw_bits(&mut self, n: u32) -> Result<u64> {
        let mask = bit_mask(n);

        let Some(&raw) = self.buf.get(self.pos) else {
            tracing::debug!(drawn = self.pos, "replay buffer exhausted");
            return Err(RapidError::Overrun { drawn: self.pos });
        };

        let word = raw & mask;
        self.recorder.record(word);
        self.pos += 1;

        Ok(word)
    }

    fn begin_group(&mut self, label: &str, removable: bool) -> GroupHandle {
        self.recorder.begin_group(label, removable)
    }

    fn end_group(&mut self, handle: GroupHandle, discard: bool) {
        self.recorder.end_group(handle, discard)
    }
}
