//! Overlay buffer: an insertion-only view over a module's original source.
//!
//! Templates never re-parse or rewrite module text directly. They record
//! insertions against the original text, either at a byte offset or into one
//! of two reserved pre-content zones, and the buffer splices everything
//! together once the pass is over. The overlay also owns the per-pass
//! import-emission record, so discarding the overlay discards the dedup state
//! with it and a retried pass starts clean.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::module_graph::ModuleId;

/// Where an insertion lands relative to the original text.
///
/// `Prologue` and `Prelude` are the two reserved zones outside the real
/// offset range: `Prologue` text renders before everything else in the
/// module, `Prelude` text after all `Prologue` text but still ahead of the
/// first byte of original source. Within a zone, and among insertions at the
/// same offset, call order is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPoint {
    /// First pre-content zone, used for module-level flag statements.
    Prologue,
    /// Second pre-content zone, used for import initialization statements.
    Prelude,
    /// Byte offset into the original source. Must lie on a char boundary;
    /// offsets past the end append after the original text.
    At(u32),
}

/// Dedup key for import initialization: the resolved target module when the
/// graph has one, otherwise the raw request string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EmissionKey {
    Module(ModuleId),
    Request(String),
}

#[derive(Debug)]
struct Insertion {
    /// 0 = `Prologue`, 1 = `Prelude`, 2 = offset-addressed.
    rank: u8,
    offset: u32,
    text: String,
}

/// Insertion-only mutable view over one module's source, materialized into
/// final text at the end of a code-generation pass.
#[derive(Debug)]
pub struct Overlay {
    source: Arc<String>,
    insertions: Vec<Insertion>,
    emitted_imports: FxHashSet<EmissionKey>,
}

impl Overlay {
    /// Wrap a module's original source text.
    pub fn new(source: Arc<String>) -> Self {
        Self {
            source,
            insertions: Vec::new(),
            emitted_imports: FxHashSet::default(),
        }
    }

    /// Original text this overlay wraps.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Record `text` at `point`. Insertions never shift one another; all
    /// offsets address the original text.
    pub fn insert(&mut self, point: InsertPoint, text: impl Into<String>) {
        let (rank, offset) = match point {
            InsertPoint::Prologue => (0, 0),
            InsertPoint::Prelude => (1, 0),
            InsertPoint::At(offset) => (2, offset),
        };
        self.insertions.push(Insertion {
            rank,
            offset,
            text: text.into(),
        });
    }

    /// True once an initialization for `key` has been recorded.
    pub fn import_emitted(&self, key: &EmissionKey) -> bool {
        self.emitted_imports.contains(key)
    }

    /// Record an initialization for `key`. Returns false when one was already
    /// recorded, in which case the caller must not emit again.
    pub fn mark_import_emitted(&mut self, key: EmissionKey) -> bool {
        self.emitted_imports.insert(key)
    }

    /// Splice all recorded insertions into the original text.
    pub fn materialize(&self) -> String {
        let mut order: Vec<usize> = (0..self.insertions.len()).collect();
        // Stable sort: same-zone and same-offset insertions keep call order.
        order.sort_by_key(|&index| {
            let insertion = &self.insertions[index];
            (insertion.rank, insertion.offset)
        });

        let inserted_len: usize = self.insertions.iter().map(|i| i.text.len()).sum();
        let mut out = String::with_capacity(self.source.len() + inserted_len);
        let mut cursor = 0usize;
        for &index in &order {
            let insertion = &self.insertions[index];
            if insertion.rank < 2 {
                out.push_str(&insertion.text);
                continue;
            }
            let offset = (insertion.offset as usize).min(self.source.len());
            if offset > cursor {
                out.push_str(&self.source[cursor..offset]);
                cursor = offset;
            }
            out.push_str(&insertion.text);
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}
