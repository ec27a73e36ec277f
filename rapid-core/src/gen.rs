//! Generator boundary: turning bitstream entropy into values.
//!
//! Concrete generators for integers, collections and so on live outside
//! this crate. What lives here is the contract they share: every value is
//! drawn inside a group, so shrinking can delete it as a unit.

use crate::{data::*, error::*, recorder::*, stream::*};
use std::fmt::Debug;

/// Something that can materialize a `T` from a bitstream.
pub trait Generator<T> {
    /// Name used for the group wrapping each drawn value.
    fn label(&self) -> &str;

    /// Draw a value without opening a group of its own.
    fn generate(&self, s: &mut dyn BitStream) -> Result<T>;

    /// Draw a value inside a removable group.
    ///
    /// Errors are terminal for the stream: on error the group is left open,
    /// so callers must propagate the error rather than recover and keep
    /// drawing. Closing any enclosing group afterwards panics.
    fn value(&self, s: &mut dyn BitStream) -> Result<T> {
        let handle = s.begin_group(self.label(), true);
        let value = self.generate(&mut *s)?;
        s.end_group(handle, false);
        Ok(value)
    }
}

type GenFn<T> = Box<dyn Fn(&mut dyn BitStream) -> Result<T>>;

/// A generator built from a closure.
pub struct Gen<T> {
    label: String,
    generator: GenFn<T>,
}

impl<T> Gen<T> {
    /// Create a new generator from a function.
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut dyn BitStream) -> Result<T> + 'static,
    {
        Gen {
            label: label.into(),
            generator: Box::new(f),
        }
    }
}

impl<T> Generator<T> for Gen<T> {
    fn label(&self) -> &str {
        &self.label
    }

    fn generate(&self, s: &mut dyn BitStream) -> Result<T> {
        (self.generator)(s)
    }
}

impl Gen<u64> {
    /// Generate the raw low `n` bits of one word.
    pub fn bits(n: u32) -> Self {
        bit_mask(n); // reject bad widths at construction
        Gen::new(format!("bits({n})"), move |s| s.draw_bits(n))
    }
}

impl Gen<bool> {
    /// Generate a random boolean from a single bit.
    pub fn bool() -> Self {
        Gen::new("bool", |s| Ok(s.draw_bits(1)? == 1))
    }
}

impl<T> Gen<T>
where
    T: 'static,
{
    /// Map a function over the generated values.
    pub fn map<U, F>(self, f: F) -> Gen<U>
    where
        F: Fn(T) -> U + 'static,
        U: 'static,
    {
        let Gen { label, generator } = self;
        Gen::new(label, move |s| generator(s).map(&f))
    }

    /// Keep drawing until `predicate` accepts, giving up after the default
    /// number of tries from [`Config`].
    pub fn filter<F>(self, predicate: F) -> Gen<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.filter_tries(Config::default().filter_tries, predicate)
    }

    /// Keep drawing until `predicate` accepts, at most `tries` times.
    ///
    /// Each try runs in its own non-removable group; rejected tries are
    /// closed as discarded, so pruning the recording leaves only the
    /// accepted draw behind.
    pub fn filter_tries<F>(self, tries: usize, predicate: F) -> Gen<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        let Gen { label, generator } = self;
        let filtered = format!("{label}.filter");
        Gen::new(filtered.clone(), move |s| {
            for _ in 0..tries {
                let handle = s.begin_group("filter", false);
                let value = generator(&mut *s)?;
                let accepted = predicate(&value);
                s.end_group(handle, !accepted);
                if accepted {
                    return Ok(value);
                }
            }
            Err(RapidError::Rejected {
                label: filtered.clone(),
                tries,
            })
        })
    }
}

/// Drawing context handed to test bodies.
pub struct Data<'a> {
    stream: &'a mut dyn BitStream,
}

impl<'a> Data<'a> {
    /// Wrap a bitstream for drawing.
    pub fn new(stream: &'a mut dyn BitStream) -> Self {
        Data { stream }
    }

    /// Draw a value from `gen`. The label names the value in logs.
    ///
    /// Composite values come back whole; destructure tuples with a `let`
    /// pattern to spread them over several bindings.
    pub fn draw<T, G>(&mut self, gen: &G, label: &str) -> Result<T>
    where
        T: Debug,
        G: Generator<T> + ?Sized,
    {
        let value = gen.value(&mut *self.stream)?;
        tracing::trace!(label, generator = gen.label(), value = ?value, "drew value");
        Ok(value)
    }

    /// Underlying bitstream, for generators that drive it directly.
    pub fn stream(&mut self) -> &mut dyn BitStream {
        &mut *self.stream
    }
}

/// Draw one value from a fresh random stream built from `config`.
///
/// Returns the value with the seed that produced it and the recording of
/// the run (empty unless `config.persist` is set).
pub fn generate<T, G>(config: &Config, gen: &G) -> Result<(T, Seed, Recorder)>
where
    G: Generator<T> + ?Sized,
{
    let mut stream = config.random_stream();
    let value = gen.value(&mut stream)?;
    let seed = stream.seed();
    Ok((value, seed, stream.into_recorder()))
}

/// Replay `buf` through `gen`, re-recording groups when `persist` is set.
///
/// An [`RapidError::Overrun`] means the candidate buffer is too short for
/// the path the generator took and should be skipped.
pub fn replay<T, G>(buf: Vec<u64>, persist: bool, gen: &G) -> Result<(T, Recorder)>
where
    G: Generator<T> + ?Sized,
{
    let mut stream = BufBitStream::new(buf, persist);
    let value = gen.value(&mut stream)?;
    Ok((value, stream.into_recorder()))
}
