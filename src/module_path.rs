//! Dotted module-path addressing for discoverable filter modules.
//!
//! [`ModulePath`] is a small value type over an ordered sequence of
//! segments, joined with `.` (package.module style). It exists purely to
//! address plugin modules during [discovery](crate::discover) — it is not a
//! filesystem path.
//!
//! Immutable value semantics: every operation returns a new instance.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("module path is empty")]
    Empty,
    #[error("module path '{0}' contains an empty segment")]
    EmptySegment(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// An ordered, dot-separated module path such as `myapp.image_filters`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath {
    segments: Vec<String>,
}

impl ModulePath {
    /// Parse a dotted string into a path.
    ///
    /// Rejects the empty string and paths with empty segments
    /// (`"a..b"`, `".a"`, `"a."`).
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        Ok(Self { segments })
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// Last segment.
    pub fn leaf(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// All-but-last segments as a new path.
    ///
    /// A single-segment path has no branch; that is structural misuse, not
    /// a recoverable condition.
    pub fn branch(&self) -> Result<ModulePath, PathError> {
        if self.segments.len() > 1 {
            Ok(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        } else {
            Err(PathError::InvalidOperation(format!(
                "cannot take the branch of single-segment path '{self}'"
            )))
        }
    }

    /// A new path with one more segment appended.
    pub fn extend(&self, leaf: &str) -> ModulePath {
        let mut segments = self.segments.clone();
        segments.push(leaf.to_string());
        Self { segments }
    }
}

impl std::fmt::Display for ModulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl std::str::FromStr for ModulePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_dots() {
        let p = ModulePath::parse("graphic.effect.zoom").unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.root(), "graphic");
        assert_eq!(p.leaf(), "zoom");
    }

    #[test]
    fn parse_single_segment() {
        let p = ModulePath::parse("myapp").unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.root(), "myapp");
        assert_eq!(p.leaf(), "myapp");
    }

    #[test]
    fn parse_rejects_empty_string() {
        assert_eq!(ModulePath::parse(""), Err(PathError::Empty));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(matches!(
            ModulePath::parse("a..b"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            ModulePath::parse(".a"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            ModulePath::parse("a."),
            Err(PathError::EmptySegment(_))
        ));
    }

    #[test]
    fn display_round_trips() {
        for s in ["a", "a.b", "graphic.effect.zoom"] {
            let p = ModulePath::parse(s).unwrap();
            assert_eq!(ModulePath::parse(&p.to_string()).unwrap(), p);
            assert_eq!(p.to_string(), s);
        }
    }

    #[test]
    fn branch_drops_the_leaf() {
        let p = ModulePath::parse("a.b.c").unwrap();
        assert_eq!(p.branch().unwrap(), ModulePath::parse("a.b").unwrap());
    }

    #[test]
    fn branch_of_single_segment_is_invalid() {
        let p = ModulePath::parse("solo").unwrap();
        assert!(matches!(p.branch(), Err(PathError::InvalidOperation(_))));
    }

    #[test]
    fn extend_returns_new_path_without_mutation() {
        let p = ModulePath::parse("myapp").unwrap();
        let extended = p.extend("image_filters");
        assert_eq!(extended.to_string(), "myapp.image_filters");
        assert_eq!(p.to_string(), "myapp");
    }

    #[test]
    fn from_str_delegates_to_parse() {
        let p: ModulePath = "a.b".parse().unwrap();
        assert_eq!(p.leaf(), "b");
    }
}
