//! Path cursor and delta-path encoding.
//!
//! Directories are compared as sequences of components rather than as
//! strings, so the codec does not depend on the host separator. On the wire,
//! multi-level descents are joined with [`WIRE_SEPARATOR`].

use std::path::{Component, Path, PathBuf};

use compact_str::CompactString;

use crate::step::Step;

/// Separator used inside `Down` names.
pub const WIRE_SEPARATOR: char = '/';

/// Split a path into its normal components.
///
/// Root, prefix and `.` components are dropped; `..` pops the previous
/// component so the result is always a plain downward path from the root.
pub fn path_components(path: &Path) -> Vec<CompactString> {
    let mut out: Vec<CompactString> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => out.push(CompactString::new(name.to_string_lossy())),
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
        }
    }
    out
}

/// The movement from one directory to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathDelta {
    /// Levels to climb from the previous directory.
    pub up: u32,
    /// Components to descend into afterwards.
    pub down: Vec<CompactString>,
}

impl PathDelta {
    /// Compute the delta between two component sequences via their longest
    /// common prefix.
    pub fn between<A, B>(prev: &[A], next: &[B]) -> Self
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let common = prev
            .iter()
            .zip(next)
            .take_while(|(a, b)| a.as_ref() == b.as_ref())
            .count();
        Self {
            up: u32::try_from(prev.len() - common).unwrap_or(u32::MAX),
            down: next[common..]
                .iter()
                .map(|c| CompactString::new(c.as_ref()))
                .collect(),
        }
    }

    /// Delta between two filesystem paths.
    pub fn between_paths(prev: &Path, next: &Path) -> Self {
        Self::between(&path_components(prev), &path_components(next))
    }

    /// True if the two directories were the same.
    pub fn is_empty(&self) -> bool {
        self.up == 0 && self.down.is_empty()
    }

    /// The descent joined for the wire, empty if there is none.
    ///
    /// Always relative: the first descent of a stream is `srv/data`, not
    /// `/srv/data`. [`PathCursor::down`] skips empty components, so a
    /// decoder reads either form to the same place.
    pub fn down_name(&self) -> String {
        let mut out = String::new();
        for (i, component) in self.down.iter().enumerate() {
            if i > 0 {
                out.push(WIRE_SEPARATOR);
            }
            out.push_str(component);
        }
        out
    }

    /// The steps encoding this delta: an `Up` if it climbs, then a `Down` if
    /// it descends.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(2);
        if self.up > 0 {
            steps.push(Step::Up(self.up));
        }
        if !self.down.is_empty() {
            steps.push(Step::Down(self.down_name()));
        }
        steps
    }
}

/// The current directory as a stack of components.
///
/// An empty cursor is the filesystem root, which doubles as the "no previous
/// directory" state before the first directory of a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathCursor {
    components: Vec<CompactString>,
}

impl PathCursor {
    /// A cursor at the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor positioned at `path`.
    pub fn at(path: &Path) -> Self {
        Self {
            components: path_components(path),
        }
    }

    /// Number of components below the root.
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// Current components.
    pub fn components(&self) -> &[CompactString] {
        &self.components
    }

    /// Climb `count` levels, stopping at the root. Returns the number of
    /// levels actually climbed.
    pub fn up(&mut self, count: u32) -> usize {
        let levels = (count as usize).min(self.components.len());
        self.components.truncate(self.components.len() - levels);
        levels
    }

    /// Descend into `name`, which may hold several components joined by
    /// [`WIRE_SEPARATOR`]. Empty components are ignored.
    pub fn down(&mut self, name: &str) {
        self.components.extend(
            name.split(WIRE_SEPARATOR)
                .filter(|c| !c.is_empty() && *c != ".")
                .map(CompactString::new),
        );
    }

    /// Apply a movement step. File steps leave the cursor unchanged.
    pub fn apply(&mut self, step: &Step) {
        match step {
            Step::Up(count) => {
                self.up(*count);
            }
            Step::Down(name) => self.down(name),
            Step::File(_) => {}
        }
    }

    /// Apply a delta.
    pub fn apply_delta(&mut self, delta: &PathDelta) {
        self.up(delta.up);
        self.components.extend(delta.down.iter().cloned());
    }

    /// Delta from the cursor's position to `target`.
    pub fn delta_to(&self, target: &Path) -> PathDelta {
        PathDelta::between(&self.components, &path_components(target))
    }

    /// Move to `target`, returning the delta that got there.
    pub fn move_to(&mut self, target: &Path) -> PathDelta {
        let delta = self.delta_to(target);
        self.apply_delta(&delta);
        delta
    }

    /// Absolute path of the current directory.
    pub fn path(&self) -> PathBuf {
        let mut path = PathBuf::from("/");
        path.extend(self.components.iter().map(|c| c.as_str()));
        path
    }
}
