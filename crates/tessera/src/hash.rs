//! Incremental-build hash over code-generation inputs.
//!
//! Everything that affects a module's generated text is folded into a
//! SHA-256 digest so the surrounding build pipeline can detect when output
//! must be regenerated. Hashing never fails: absent metadata is folded as
//! fixed marker strings instead of being skipped.

use sha2::{Digest, Sha256};

/// Accumulating digest for one module's code-generation state.
#[derive(Debug, Default)]
pub struct CodegenHash {
    digest: Sha256,
}

impl CodegenHash {
    /// Create an empty hash.
    pub fn new() -> Self {
        Self {
            digest: Sha256::new(),
        }
    }

    /// Fold raw bytes into the digest.
    pub fn update(&mut self, bytes: impl AsRef<[u8]>) {
        self.digest.update(bytes.as_ref());
    }

    /// Finish and return the hex-encoded digest.
    pub fn finish(self) -> String {
        let digest = self.digest.finalize();
        digest.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}
