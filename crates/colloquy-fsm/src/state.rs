//! Conversation states and their canonical names.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A named point in a conversation's state machine.
///
/// What filters compare and storage persists is the state's *canonical*
/// form:
///
/// - `None` when the state has no name (a fresh or cleared
///   conversation),
/// - `"*"` when the name is the wildcard,
/// - `"{group}:{name}"` otherwise, where `group` is the owning group's
///   fully-qualified name, an explicit override, or `"@"` for a state
///   never bound to any group.
///
/// Equality and hashing are defined on the canonical form, which is
/// what makes a `State` and the raw string read back from storage
/// interchangeable.
#[derive(Clone, Default)]
pub struct State {
    name: Option<Arc<str>>,
    group: Option<Arc<str>>,
    canonical: Option<Arc<str>>,
}

impl State {
    /// Creates a free-standing state.
    ///
    /// Until bound to a group it canonicalizes with the `"@"` fallback
    /// qualifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()), None)
    }

    /// Creates a state qualified by an explicit group name.
    pub fn with_group(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self::build(Some(name.into()), Some(group.into()))
    }

    /// The wildcard state; matches any stored value.
    pub fn any() -> Self {
        Self::new("*")
    }

    /// The empty state; matches only an absent stored value.
    pub fn none() -> Self {
        Self::default()
    }

    fn build(name: Option<String>, group: Option<String>) -> Self {
        let name: Option<Arc<str>> = name.map(Into::into);
        let group: Option<Arc<str>> = group.map(Into::into);
        let canonical = match name.as_deref() {
            None => None,
            Some("*") => Some(Arc::from("*")),
            Some(n) => {
                let qualifier = group.as_deref().unwrap_or("@");
                Some(Arc::from(format!("{qualifier}:{n}").as_str()))
            }
        };
        Self {
            name,
            group,
            canonical,
        }
    }

    /// Re-binds this state under an owning group's name.
    pub(crate) fn bind(&self, group: &str) -> Self {
        Self::build(
            self.name.as_deref().map(str::to_owned),
            Some(group.to_owned()),
        )
    }

    /// The state's literal name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The group qualifier, if any.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The canonical string form.
    pub fn canonical(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    pub(crate) fn canonical_arc(&self) -> Option<Arc<str>> {
        self.canonical.clone()
    }

    /// Whether this state accepts the given raw stored value.
    ///
    /// The wildcard accepts anything, absent included; otherwise the
    /// canonical forms must match exactly.
    pub fn matches(&self, raw: Option<&str>) -> bool {
        match self.canonical.as_deref() {
            Some("*") => true,
            canonical => canonical == raw,
        }
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("canonical", &self.canonical())
            .finish()
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.canonical().hash(hasher);
    }
}

impl PartialEq<str> for State {
    fn eq(&self, other: &str) -> bool {
        self.canonical() == Some(other)
    }
}

impl PartialEq<&str> for State {
    fn eq(&self, other: &&str) -> bool {
        self.canonical() == Some(*other)
    }
}

impl PartialEq<State> for str {
    fn eq(&self, other: &State) -> bool {
        other.canonical() == Some(self)
    }
}

impl PartialEq<State> for &str {
    fn eq(&self, other: &State) -> bool {
        other.canonical() == Some(*self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_canonical_forms() {
        assert_eq!(State::none().canonical(), None);
        assert_eq!(State::any().canonical(), Some("*"));
        assert_eq!(State::new("waiting").canonical(), Some("@:waiting"));
        assert_eq!(
            State::with_group("waiting", "Registration").canonical(),
            Some("Registration:waiting")
        );
    }

    #[test]
    fn test_wildcard_matches_anything() {
        let any = State::any();
        assert!(any.matches(Some("Registration:waiting")));
        assert!(any.matches(Some("@:loose")));
        assert!(any.matches(None));
    }

    #[test]
    fn test_exact_matching() {
        let state = State::with_group("waiting", "Registration");
        assert!(state.matches(Some("Registration:waiting")));
        assert!(!state.matches(Some("Registration:done")));
        assert!(!state.matches(None));

        assert!(State::none().matches(None));
        assert!(!State::none().matches(Some("Registration:waiting")));
    }

    #[test]
    fn test_string_equality_both_directions() {
        let state = State::with_group("waiting", "Registration");
        assert_eq!(state, "Registration:waiting");
        assert_eq!("Registration:waiting", state);
        assert_ne!(state, "Registration:done");
    }

    #[test]
    fn test_states_are_map_keys_by_canonical_form() {
        let mut transitions: HashMap<State, &str> = HashMap::new();
        transitions.insert(State::with_group("waiting", "Registration"), "next");

        // A separately constructed state with the same canonical form
        // finds the entry.
        let probe = State::with_group("waiting", "Registration");
        assert_eq!(transitions.get(&probe), Some(&"next"));
    }

    #[test]
    fn test_rebinding_overrides_qualifier() {
        let loose = State::new("waiting");
        let bound = loose.bind("Registration.Payment");
        assert_eq!(bound.canonical(), Some("Registration.Payment:waiting"));
        assert_eq!(bound.name(), Some("waiting"));
        // The original is untouched.
        assert_eq!(loose.canonical(), Some("@:waiting"));
    }
}
