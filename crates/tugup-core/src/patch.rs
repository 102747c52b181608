//! Edit scheduling and reverse-order patch application.
//!
//! The structural pass produces `(Position, EditCallback)` pairs. They are
//! aggregated into an [`EditMap`] keyed by position, preserving discovery
//! order per position, and then applied by [`apply_edits`] in a single walk
//! over the token stream.
//!
//! # Ordering Contract
//!
//! [`apply_edits`] visits token indices from the last to the first. An edit
//! may insert or delete tokens, shifting every index after the one it was
//! given; processing the highest index first guarantees that every index not
//! yet visited is still valid when its turn comes. Edits scheduled at the
//! *same* position run in registration order, and each one sees the stream
//! as the previous one left it.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::stream::{TokenError, TokenStream};
use crate::text::Position;

/// Deferred token mutation, invoked with the stream and the index of the
/// token at the position it was scheduled against.
pub type EditCallback = Box<dyn FnOnce(&mut TokenStream, usize) -> Result<(), TokenError>>;

// ============================================================================
// Scheduled Edit
// ============================================================================

/// An edit callback bound to the position of the token it starts at.
pub struct ScheduledEdit {
    pub position: Position,
    pub callback: EditCallback,
}

impl ScheduledEdit {
    /// Bind `callback` to `position`.
    pub fn new<F>(position: Position, callback: F) -> Self
    where
        F: FnOnce(&mut TokenStream, usize) -> Result<(), TokenError> + 'static,
    {
        ScheduledEdit {
            position,
            callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for ScheduledEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledEdit")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Edit Map
// ============================================================================

/// Position-keyed edit schedule for one file.
#[derive(Default)]
pub struct EditMap {
    edits: HashMap<Position, Vec<EditCallback>>,
    count: usize,
}

impl EditMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to the list at `position`.
    pub fn schedule<F>(&mut self, position: Position, callback: F)
    where
        F: FnOnce(&mut TokenStream, usize) -> Result<(), TokenError> + 'static,
    {
        self.push(ScheduledEdit::new(position, callback));
    }

    /// Append an already-bound edit.
    pub fn push(&mut self, edit: ScheduledEdit) {
        self.edits
            .entry(edit.position)
            .or_default()
            .push(edit.callback);
        self.count += 1;
    }

    /// Total number of scheduled callbacks.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of distinct positions with at least one edit.
    pub fn position_count(&self) -> usize {
        self.edits.len()
    }

    fn first_position(&self) -> Option<Position> {
        self.edits.keys().min().copied()
    }

    fn take(&mut self, position: Position) -> Option<Vec<EditCallback>> {
        let callbacks = self.edits.remove(&position)?;
        self.count -= callbacks.len();
        Some(callbacks)
    }
}

impl Extend<ScheduledEdit> for EditMap {
    fn extend<I: IntoIterator<Item = ScheduledEdit>>(&mut self, iter: I) {
        for edit in iter {
            self.push(edit);
        }
    }
}

impl fmt::Debug for EditMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut positions: Vec<(&Position, usize)> = self
            .edits
            .iter()
            .map(|(position, callbacks)| (position, callbacks.len()))
            .collect();
        positions.sort();
        f.debug_struct("EditMap")
            .field("count", &self.count)
            .field("positions", &positions)
            .finish()
    }
}

// ============================================================================
// Patch Applier
// ============================================================================

/// Apply every scheduled edit, walking the stream from the last token to the
/// first. Returns the number of callbacks invoked.
///
/// Tokens with empty text (dedent/end markers) never anchor an edit and are
/// skipped.
///
/// # Errors
///
/// The first failing callback aborts the walk. Edits left over after the walk
/// (scheduled inside a token, such as an f-string, or at a token removed by a
/// later-indexed edit) fail with [`TokenError::Unanchored`]. Either way the
/// stream is partially edited and must be discarded by the caller.
pub fn apply_edits(stream: &mut TokenStream, mut edits: EditMap) -> Result<usize, TokenError> {
    let mut applied = 0;
    let mut index = stream.len();

    while index > 0 && !edits.is_empty() {
        index -= 1;
        let Some(token) = stream.get(index) else {
            continue;
        };
        if token.text.is_empty() {
            continue;
        }
        let Some(position) = token.position else {
            continue;
        };
        let Some(callbacks) = edits.take(position) else {
            continue;
        };
        for callback in callbacks {
            callback(stream, index)?;
            applied += 1;
        }
    }

    if let Some(position) = edits.first_position() {
        debug!(
            count = edits.len(),
            position = %position,
            "edits scheduled at positions with no surviving token"
        );
        return Err(TokenError::Unanchored {
            count: edits.len(),
            position,
        });
    }
    Ok(applied)
}

// ============================================================================
// Tests
// ============================================================================
