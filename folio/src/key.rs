use std::fmt;
use std::hash::Hasher;
use std::io;

use rustc_hash::FxHasher;
use serde::Serialize;

use crate::document::Block;
use crate::section::Section;

/// Content-derived identity for a keyed child in the presentation tree.
///
/// Two structurally identical values get the same key wherever they appear.
/// Keys only help a reconciler match children across re-renders; they are
/// not document identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// Hash the JSON serialization of `value`.
    ///
    /// FxHasher has no per-process seed, so the same content yields the same
    /// key across runs.
    pub fn derive<T: Keyed + ?Sized>(value: &T) -> Key {
        let mut writer = HashWriter(FxHasher::default());
        if let Err(err) = serde_json::to_writer(&mut writer, value) {
            // Keyed types derive Serialize over strings, numbers and
            // sequences, and the writer never fails.
            log::error!("key derivation hashed a partial serialization: {}", err);
        }
        Key(format!("{:016x}", writer.0.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content that can be keyed: the crate's own model types, whose
/// serialization cannot fail.
pub trait Keyed: Serialize + sealed::Sealed {}

impl Keyed for Block {}
impl Keyed for Vec<Block> {}
impl Keyed for Section {}

mod sealed {
    use crate::document::Block;
    use crate::section::Section;

    pub trait Sealed {}

    impl Sealed for Block {}
    impl Sealed for Vec<Block> {}
    impl Sealed for Section {}
}

struct HashWriter(FxHasher);

impl io::Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
