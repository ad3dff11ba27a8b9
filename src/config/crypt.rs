//! Cyclic XOR stream cipher for config files
//!
//! The key stream position carries over between calls, so a file can be
//! processed chunk by chunk. Every load and save starts its own stream.

/// XOR key stream over a non-empty key
#[derive(Debug, Clone)]
pub struct Cipher {
    key: Vec<u8>,
    cursor: usize,
}

impl Cipher {
    /// Returns `None` for an empty key
    pub fn new(key: &[u8]) -> Option<Self> {
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_vec(),
            cursor: 0,
        })
    }

    /// En/decrypt `buffer` in place, advancing the key stream
    pub fn apply(&mut self, buffer: &mut [u8]) {
        for byte in buffer.iter_mut() {
            *byte ^= self.key[self.cursor];
            self.cursor = (self.cursor + 1) % self.key.len();
        }
    }
}
