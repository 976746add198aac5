//! # Note stack
//!
//! The keys held down on a voice, most recently pushed on top (index 0). When the arpeggiator asks for sorted order
//! the stack is kept in ascending pitch order instead.
//!
//! The same note may be on the stack more than once. When the stack is full the note which was pushed first is dropped
//! to make room, whatever its position.

use heapless::Vec;

use crate::NOTE_STACK_SIZE;

/// A bounded stack of held notes is represented here
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteStack {
    notes: Vec<u8, NOTE_STACK_SIZE>,
    /// push order of each entry of `notes`
    ages: Vec<u32, NOTE_STACK_SIZE>,
    next_age: u32,
}

impl NoteStack {
    /// `NoteStack::new()` is a new empty note stack
    pub const fn new() -> Self {
        Self {
            notes: Vec::new(),
            ages: Vec::new(),
            next_age: 0,
        }
    }

    /// `ns.push(n, sorted)` puts note `n` on top of the stack, or at its pitch position if `sorted`
    pub fn push(&mut self, note: u8, sorted: bool) {
        if self.notes.is_full() {
            let oldest = self
                .ages
                .iter()
                .enumerate()
                .min_by_key(|&(_, &age)| age)
                .map(|(ix, _)| ix);
            if let Some(ix) = oldest {
                self.remove_at(ix);
            }
        }

        let age = self.next_age;
        self.next_age = self.next_age.wrapping_add(1);
        // can't fail, there is room now
        self.notes.push(note).ok();
        self.ages.push(age).ok();

        let ix = if sorted {
            self.notes.iter().position(|&n| n >= note).unwrap_or(0)
        } else {
            0
        };
        self.notes[ix..].rotate_right(1);
        self.ages[ix..].rotate_right(1);
    }

    /// `ns.remove(n)` removes the topmost instance of note `n`, true iff there was one
    pub fn remove(&mut self, note: u8) -> bool {
        match self.notes.iter().position(|&n| n == note) {
            Some(ix) => {
                self.remove_at(ix);
                true
            }
            None => false,
        }
    }

    fn remove_at(&mut self, ix: usize) {
        self.notes[ix..].rotate_left(1);
        self.notes.pop();
        self.ages[ix..].rotate_left(1);
        self.ages.pop();
        if self.notes.is_empty() {
            self.next_age = 0;
        }
    }

    /// `ns.clear()` removes every note
    pub fn clear(&mut self) {
        self.notes.clear();
        self.ages.clear();
        self.next_age = 0;
    }

    /// `ns.top()` is the note on top of the stack, if any
    pub fn top(&self) -> Option<u8> {
        self.notes.first().copied()
    }

    /// `ns.get(ix)` is the note at stack position `ix`, if any
    pub fn get(&self, ix: usize) -> Option<u8> {
        self.notes.get(ix).copied()
    }

    /// `ns.len()` is the number of held notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// `ns.is_empty()` is true iff no note is held
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// `ns.as_slice()` is every held note, top first
    pub fn as_slice(&self) -> &[u8] {
        &self.notes
    }
}
