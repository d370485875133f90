//! State filtering for matchers.
//!
//! A [`StateFilter`] gates a matcher on the conversation's current
//! state. Pattern shapes are resolved once at construction, so each
//! event is checked with a plain comparison rather than re-inspecting
//! what kind of pattern was declared.

use std::sync::Arc;

use colloquy_core::{EventContext, Matcher};

use crate::context::RawState;
use crate::error::FilterError;
use crate::group::StatesGroup;
use crate::state::State;

/// One acceptable shape of the current state.
#[derive(Debug, Clone)]
pub enum StatePattern {
    /// Passes only while no state is set.
    Absent,
    /// Compares the raw string as-is.
    Literal(String),
    /// Passes unconditionally.
    Wildcard,
    /// Compares against one declared state.
    Exact(State),
    /// Passes for any state in the group or its descendants.
    Group(Arc<StatesGroup>),
}

impl StatePattern {
    pub fn matches(&self, raw: Option<&str>) -> bool {
        match self {
            Self::Absent => raw.is_none(),
            Self::Literal(literal) => raw == Some(literal.as_str()),
            Self::Wildcard => true,
            Self::Exact(state) => state.matches(raw),
            Self::Group(group) => raw.is_some_and(|raw| group.contains_name(raw)),
        }
    }
}

impl From<&str> for StatePattern {
    fn from(value: &str) -> Self {
        match value {
            "*" => Self::Wildcard,
            literal => Self::Literal(literal.to_owned()),
        }
    }
}

impl From<String> for StatePattern {
    fn from(value: String) -> Self {
        match value.as_str() {
            "*" => Self::Wildcard,
            _ => Self::Literal(value),
        }
    }
}

impl From<State> for StatePattern {
    fn from(state: State) -> Self {
        Self::Exact(state)
    }
}

impl From<&State> for StatePattern {
    fn from(state: &State) -> Self {
        Self::Exact(state.clone())
    }
}

impl From<StatesGroup> for StatePattern {
    fn from(group: StatesGroup) -> Self {
        Self::Group(Arc::new(group))
    }
}

impl From<&StatesGroup> for StatePattern {
    fn from(group: &StatesGroup) -> Self {
        Self::Group(Arc::new(group.clone()))
    }
}

impl From<Arc<StatesGroup>> for StatePattern {
    fn from(group: Arc<StatesGroup>) -> Self {
        Self::Group(group)
    }
}

/// A set of patterns; the filter passes when any of them matches.
#[derive(Debug, Clone)]
pub struct StateFilter {
    patterns: Vec<StatePattern>,
}

impl StateFilter {
    /// Builds a filter from one or more patterns.
    ///
    /// # Panics
    ///
    /// Panics when `patterns` is empty: a filter that can never pass
    /// is a configuration mistake, caught at construction.
    pub fn new<I>(patterns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<StatePattern>,
    {
        match Self::try_new(patterns) {
            Ok(filter) => filter,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible construction for filters assembled from configuration.
    pub fn try_new<I>(patterns: I) -> Result<Self, FilterError>
    where
        I: IntoIterator,
        I::Item: Into<StatePattern>,
    {
        let patterns: Vec<StatePattern> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Err(FilterError::EmptyPatternSet);
        }
        Ok(Self { patterns })
    }

    /// Passes only while no state is set.
    pub fn absent() -> Self {
        Self {
            patterns: vec![StatePattern::Absent],
        }
    }

    /// Passes unconditionally.
    pub fn any() -> Self {
        Self {
            patterns: vec![StatePattern::Wildcard],
        }
    }

    pub fn patterns(&self) -> &[StatePattern] {
        &self.patterns
    }

    pub fn matches(&self, raw: Option<&str>) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(raw))
    }

    /// Checks the state the middleware injected into the context.
    pub fn check(&self, ctx: &EventContext) -> bool {
        let raw = ctx.get::<RawState>().unwrap_or_default();
        self.matches(raw.as_deref())
    }
}

/// State-filtering sugar for [`Matcher`].
pub trait MatcherExt {
    /// Gates the matcher on one state pattern.
    fn state(self, pattern: impl Into<StatePattern>) -> Self;

    /// Gates the matcher on a full filter.
    fn state_filter(self, filter: StateFilter) -> Self;

    /// Gates the matcher to contexts with no state set.
    fn state_absent(self) -> Self;
}

impl MatcherExt for Matcher {
    fn state(self, pattern: impl Into<StatePattern>) -> Self {
        self.state_filter(StateFilter::new([pattern.into()]))
    }

    fn state_filter(self, filter: StateFilter) -> Self {
        self.check(move |ctx| filter.check(ctx))
    }

    fn state_absent(self) -> Self {
        self.state_filter(StateFilter::absent())
    }
}
