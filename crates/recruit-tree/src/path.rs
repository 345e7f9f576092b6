//! Index paths for addressing nodes by position
//!
//! Provides [`NodePath`], a sequence of child indices from the root. Ids are
//! opaque and change on every regrowth, so positional paths are what a user
//! types to point at "the second recruit of my first recruit" (`0.1`).

use crate::error::PathError;
use crate::tree::FAN_OUT;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path from the root to a node, one child index per level
///
/// # Examples
/// - `""` → the root
/// - `"0"` → first child of the root
/// - `"2.0.1"` → second child of the first child of the third root child
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Create path from indices
    #[inline]
    #[must_use]
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Depth below the root
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an index, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(index);
        new
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::root());
        }

        let indices = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    return Err(PathError::EmptySegment);
                }
                match seg.parse::<usize>() {
                    Ok(index) if index < FAN_OUT => Ok(index),
                    _ => Err(PathError::InvalidSegment(seg.to_string())),
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(indices))
    }
}
