//! Namespaced identifiers and holder sets.
//!
//! These are the value types every other module keys on: origin items and
//! models, target identifiers, data component names, tag references.

use std::fmt;

use thiserror::Error;

/// The reserved namespace of the origin protocol's own content. Identifiers
/// parsed without an explicit namespace land here.
pub const VANILLA_NAMESPACE: &str = "minecraft";

/// The namespace target identifiers are moved into when a mapping file tries
/// to register them under [`VANILLA_NAMESPACE`]. Target identifiers must
/// never masquerade as vanilla content.
pub const CUSTOM_NAMESPACE: &str = "conduit_custom";

/// Why an identifier could not be constructed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier namespace is empty")]
    EmptyNamespace,
    #[error("identifier path is empty")]
    EmptyPath,
    #[error("identifier path {0:?} contains a namespace separator")]
    SeparatorInPath(String),
}

/// A `namespace:path` identifier. Immutable once constructed; compared,
/// hashed and ordered by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Construct from explicit halves. Both must be non-empty and the path
    /// must not contain `:`.
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Result<Self, IdentifierError> {
        let namespace = namespace.into();
        let path = path.into();
        if namespace.is_empty() {
            return Err(IdentifierError::EmptyNamespace);
        }
        if path.is_empty() {
            return Err(IdentifierError::EmptyPath);
        }
        if path.contains(':') {
            return Err(IdentifierError::SeparatorInPath(path));
        }
        Ok(Self { namespace, path })
    }

    /// Parse `"namespace:path"`, defaulting to [`VANILLA_NAMESPACE`] when no
    /// separator is present.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        match s.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(VANILLA_NAMESPACE, s),
        }
    }

    /// An identifier in the vanilla namespace.
    pub fn vanilla(path: impl Into<String>) -> Result<Self, IdentifierError> {
        Self::new(VANILLA_NAMESPACE, path)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_vanilla(&self) -> bool {
        self.namespace == VANILLA_NAMESPACE
    }

    /// The same path under a different namespace.
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Result<Self, IdentifierError> {
        Self::new(namespace, self.path.clone())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

/// Either a direct list of identifiers or a reference to a tag that resolves
/// to one. Matching treats the list as an unordered set; tag resolution is
/// the caller's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolderSet {
    /// Explicit entries. May be empty.
    Entries(Vec<Identifier>),
    /// A single tag reference, e.g. `#minecraft:planks`.
    Tag(Identifier),
}

impl HolderSet {
    pub fn builder() -> HolderSetBuilder {
        HolderSetBuilder::default()
    }

    /// Whether `id` is directly listed. Always false for tags, which the
    /// engine cannot resolve on its own.
    pub fn contains(&self, id: &Identifier) -> bool {
        match self {
            HolderSet::Entries(entries) => entries.contains(id),
            HolderSet::Tag(_) => false,
        }
    }
}

/// Why a holder set could not be built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HolderSetError {
    #[error("holder set cannot mix explicit entries with a tag")]
    MixedSources,
}

/// Builds a [`HolderSet`] from either entries or a tag, never both.
#[derive(Debug, Default)]
pub struct HolderSetBuilder {
    entries: Vec<Identifier>,
    tag: Option<Identifier>,
}

impl HolderSetBuilder {
    pub fn entry(mut self, id: Identifier) -> Self {
        self.entries.push(id);
        self
    }

    pub fn tag(mut self, tag: Identifier) -> Self {
        self.tag = Some(tag);
        self
    }

    /// With no tag and no entries this yields an empty entry list.
    pub fn build(self) -> Result<HolderSet, HolderSetError> {
        match self.tag {
            Some(tag) if self.entries.is_empty() => Ok(HolderSet::Tag(tag)),
            Some(_) => Err(HolderSetError::MixedSources),
            None => Ok(HolderSet::Entries(self.entries)),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_namespace() {
        let id = Identifier::parse("conduit:ruby_sword").unwrap();
        assert_eq!(id.namespace(), "conduit");
        assert_eq!(id.path(), "ruby_sword");
        assert_eq!(id.to_string(), "conduit:ruby_sword");
    }

    #[test]
    fn parse_defaults_to_vanilla() {
        let id = Identifier::parse("stick").unwrap();
        assert_eq!(id.namespace(), VANILLA_NAMESPACE);
        assert!(id.is_vanilla());
    }

    #[test]
    fn rejects_empty_halves() {
        assert_eq!(Identifier::parse(":stick"), Err(IdentifierError::EmptyNamespace));
        assert_eq!(Identifier::parse("ns:"), Err(IdentifierError::EmptyPath));
        assert_eq!(Identifier::parse(""), Err(IdentifierError::EmptyPath));
    }

    #[test]
    fn rejects_separator_in_path() {
        assert!(matches!(
            Identifier::new("ns", "a:b"),
            Err(IdentifierError::SeparatorInPath(_))
        ));
    }

    #[test]
    fn holder_set_rejects_mixing() {
        let tag = Identifier::parse("minecraft:planks").unwrap();
        let entry = Identifier::parse("minecraft:oak_planks").unwrap();
        let err = HolderSet::builder().entry(entry).tag(tag).build();
        assert_eq!(err, Err(HolderSetError::MixedSources));
    }

    #[test]
    fn holder_set_empty_is_entries() {
        assert_eq!(HolderSet::builder().build(), Ok(HolderSet::Entries(vec![])));
    }

    #[test]
    fn holder_set_tag_contains_nothing() {
        let tag = Identifier::parse("minecraft:planks").unwrap();
        let set = HolderSet::builder().tag(tag.clone()).build().unwrap();
        assert!(!set.contains(&tag));
    }
}
