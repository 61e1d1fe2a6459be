//! Name-based exclusion rules for the tree walk.

/// Prefix/suffix exclusion filter applied to bare file and directory names.
///
/// A directory rejected by the filter is never descended into, so its
/// contents are invisible to the index rather than merely skipped.
#[derive(Clone, Debug, Default)]
pub struct PathFilter {
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl PathFilter {
    pub fn new(prefixes: Vec<String>, suffixes: Vec<String>) -> Self {
        // Empty patterns would match every name.
        Self {
            prefixes: prefixes.into_iter().filter(|p| !p.is_empty()).collect(),
            suffixes: suffixes.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    /// Returns true unless `name` starts with an excluded prefix or ends
    /// with an excluded suffix.
    pub fn permitted(&self, name: &str) -> bool {
        !self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
            && !self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}
