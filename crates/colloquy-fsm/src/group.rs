//! Declarative groups of conversation states.
//!
//! A [`StatesGroup`] gives a set of related states one shared
//! qualifier, and groups nest: attaching a child re-derives every
//! descendant state name under `"{parent}.{child}"`, recursively, so a
//! state's canonical form always reflects where its group ended up in
//! the hierarchy. Membership is transitive — a group contains its own
//! states and everything its children contain.
//!
//! ```rust,ignore
//! use colloquy_fsm::StatesGroup;
//!
//! let payment = StatesGroup::builder("Payment")
//!     .state("waiting_card")
//!     .build();
//!
//! let checkout = StatesGroup::builder("Checkout")
//!     .state("waiting_address")
//!     .child(payment)
//!     .build();
//!
//! // "Checkout:waiting_address" and "Checkout.Payment:waiting_card"
//! assert!(checkout.contains_name("Checkout.Payment:waiting_card"));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::state::State;

/// A named, nestable collection of states.
///
/// Construct with [`StatesGroup::builder`] or the
/// [`states_group!`](crate::states_group) macro. Groups are immutable
/// once built; the transitive state set is derived at build time.
#[derive(Debug, Clone)]
pub struct StatesGroup {
    full_name: Arc<str>,
    states: Vec<State>,
    children: Vec<StatesGroup>,
    all_states: Vec<State>,
    name_set: HashSet<Arc<str>>,
}

impl StatesGroup {
    /// Starts building a group with the given name.
    pub fn builder(name: impl Into<String>) -> GroupBuilder {
        GroupBuilder::new(name.into())
    }

    fn assemble(full_name: String, declared: Vec<State>, attached: Vec<StatesGroup>) -> Self {
        let full_name: Arc<str> = full_name.into();
        let states: Vec<State> = declared.iter().map(|s| s.bind(&full_name)).collect();
        let children: Vec<StatesGroup> = attached
            .iter()
            .map(|child| child.requalify(&full_name))
            .collect();

        let mut all_states = states.clone();
        for child in &children {
            all_states.extend_from_slice(child.all_states());
        }
        let name_set = all_states.iter().filter_map(State::canonical_arc).collect();

        Self {
            full_name,
            states,
            children,
            all_states,
            name_set,
        }
    }

    /// Rebuilds this group and all descendants under a parent prefix.
    fn requalify(&self, parent: &str) -> StatesGroup {
        let leaf = self.full_name.rsplit('.').next().unwrap_or(&self.full_name);
        StatesGroup::assemble(
            format!("{parent}.{leaf}"),
            self.states.clone(),
            self.children.clone(),
        )
    }

    /// The group's fully-qualified name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The states declared directly on this group.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The directly attached child groups.
    pub fn children(&self) -> &[StatesGroup] {
        &self.children
    }

    /// Every state owned transitively: this group's own states first,
    /// then each child's, in declaration order.
    pub fn all_states(&self) -> &[State] {
        &self.all_states
    }

    /// Looks up a directly declared state by its literal name.
    pub fn state(&self, name: &str) -> Option<State> {
        self.states
            .iter()
            .find(|state| state.name() == Some(name))
            .cloned()
    }

    /// Whether the raw canonical string names a state owned
    /// transitively by this group.
    pub fn contains_name(&self, raw: &str) -> bool {
        self.name_set.contains(raw)
    }

    /// Whether the state is owned transitively by this group.
    pub fn contains_state(&self, state: &State) -> bool {
        state
            .canonical()
            .is_some_and(|canonical| self.contains_name(canonical))
    }

    /// Whether `other` is a transitive child of this group.
    pub fn contains_group(&self, other: &StatesGroup) -> bool {
        self.children.iter().any(|child| {
            child.full_name == other.full_name || child.contains_group(other)
        })
    }
}

/// Builder assembling a [`StatesGroup`].
///
/// States are declared by literal name and bound to the group at build
/// time; previously built groups attach as children and get their names
/// re-derived under this group.
#[derive(Debug)]
pub struct GroupBuilder {
    name: String,
    states: Vec<State>,
    children: Vec<StatesGroup>,
}

impl GroupBuilder {
    fn new(name: String) -> Self {
        Self {
            name,
            states: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Declares a state by literal name.
    pub fn state(mut self, name: impl Into<String>) -> Self {
        self.states.push(State::new(name));
        self
    }

    /// Attaches a nested group.
    pub fn child(mut self, group: StatesGroup) -> Self {
        self.children.push(group);
        self
    }

    /// Builds the group, qualifying every declared state and
    /// re-deriving every descendant name.
    pub fn build(self) -> StatesGroup {
        StatesGroup::assemble(self.name, self.states, self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> StatesGroup {
        let inner = StatesGroup::builder("B").state("y").build();
        StatesGroup::builder("A").state("x").child(inner).build()
    }

    #[test]
    fn test_declared_states_are_qualified() {
        let group = StatesGroup::builder("Registration")
            .state("waiting_name")
            .state("waiting_age")
            .build();

        assert_eq!(group.full_name(), "Registration");
        assert_eq!(group.states().len(), 2);
        assert_eq!(
            group.states()[0].canonical(),
            Some("Registration:waiting_name")
        );
        assert_eq!(
            group.state("waiting_age").unwrap().canonical(),
            Some("Registration:waiting_age")
        );
        assert_eq!(group.state("missing"), None);
    }

    #[test]
    fn test_attachment_requalifies_child_states() {
        let group = nested();

        let child = &group.children()[0];
        assert_eq!(child.full_name(), "A.B");
        assert_eq!(child.states()[0].canonical(), Some("A.B:y"));
    }

    #[test]
    fn test_membership_is_transitive() {
        let group = nested();

        assert!(group.contains_name("A:x"));
        assert!(group.contains_name("A.B:y"));
        assert!(!group.contains_name("B:y"));

        let child = &group.children()[0];
        assert!(child.contains_name("A.B:y"));
        assert!(!child.contains_name("A:x"));
    }

    #[test]
    fn test_contains_state_uses_canonical_form() {
        let group = nested();
        assert!(group.contains_state(&State::with_group("x", "A")));
        assert!(group.contains_state(&State::with_group("y", "A.B")));
        assert!(!group.contains_state(&State::with_group("y", "B")));
        assert!(!group.contains_state(&State::none()));
    }

    #[test]
    fn test_contains_group_is_transitive_and_excludes_self() {
        let leaf = StatesGroup::builder("C").state("z").build();
        let mid = StatesGroup::builder("B").state("y").child(leaf).build();
        let root = StatesGroup::builder("A").state("x").child(mid).build();

        let mid_attached = &root.children()[0];
        let leaf_attached = &mid_attached.children()[0];

        assert!(root.contains_group(mid_attached));
        assert!(root.contains_group(leaf_attached));
        assert!(!root.contains_group(&root));
        assert!(!mid_attached.contains_group(&root));
    }

    #[test]
    fn test_deep_nesting_rederives_names() {
        let leaf = StatesGroup::builder("C").state("z").build();
        assert_eq!(leaf.states()[0].canonical(), Some("C:z"));

        let mid = StatesGroup::builder("B").child(leaf).build();
        assert_eq!(mid.all_states()[0].canonical(), Some("B.C:z"));

        let root = StatesGroup::builder("A").child(mid).build();
        assert_eq!(root.all_states()[0].canonical(), Some("A.B.C:z"));
        assert!(root.contains_name("A.B.C:z"));
        assert!(!root.contains_name("B.C:z"));
    }

    #[test]
    fn test_all_states_orders_own_before_descendants() {
        let group = nested();
        let names: Vec<_> = group
            .all_states()
            .iter()
            .filter_map(State::canonical)
            .collect();
        assert_eq!(names, vec!["A:x", "A.B:y"]);
    }
}
