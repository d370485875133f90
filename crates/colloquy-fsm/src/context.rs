//! Per-context storage façade.
//!
//! [`FsmContext`] binds a storage to one [`StorageKey`] so handlers
//! read and write their own conversation without touching keys or
//! backends. Nothing is cached: every call goes straight to the
//! storage, so concurrent writers always see each other.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use colloquy_core::{EventContext, ExtractError, ExtractResult, FromContext};

use crate::error::StorageResult;
use crate::key::StorageKey;
use crate::state::State;
use crate::storage::{StateData, Storage, to_state_data};

/// Anything that can be written as a state.
///
/// Covers [`State`] values, plain strings, and `Option`s of either,
/// where `None` clears the state.
pub trait IntoStateValue {
    fn into_state_value(self) -> Option<String>;
}

impl IntoStateValue for State {
    fn into_state_value(self) -> Option<String> {
        self.canonical().map(str::to_owned)
    }
}

impl IntoStateValue for &State {
    fn into_state_value(self) -> Option<String> {
        self.canonical().map(str::to_owned)
    }
}

impl IntoStateValue for &str {
    fn into_state_value(self) -> Option<String> {
        Some(self.to_owned())
    }
}

impl IntoStateValue for String {
    fn into_state_value(self) -> Option<String> {
        Some(self)
    }
}

impl<T: IntoStateValue> IntoStateValue for Option<T> {
    fn into_state_value(self) -> Option<String> {
        self.and_then(IntoStateValue::into_state_value)
    }
}

/// The state read at dispatch time, before any handler ran.
///
/// Injected into the event context by the middleware; `None` means the
/// context holds no state. Extraction never fails: without the
/// middleware it yields the absent state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawState(Option<Arc<str>>);

impl RawState {
    pub fn new(state: Option<impl Into<Arc<str>>>) -> Self {
        Self(state.map(Into::into))
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<String>> for RawState {
    fn from(state: Option<String>) -> Self {
        Self::new(state)
    }
}

impl FromContext for RawState {
    fn from_context(ctx: &EventContext) -> ExtractResult<Self> {
        Ok(ctx.get::<RawState>().unwrap_or_default())
    }
}

/// A storage bound to one context key.
///
/// # Example
///
/// ```rust,ignore
/// async fn ask_age(ctx: FsmContext) -> anyhow::Result<()> {
///     ctx.update_typed_data(&Answers { name: "alice".into() }).await?;
///     ctx.set_state(Registration::waiting_age()).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct FsmContext {
    storage: Arc<dyn Storage>,
    key: StorageKey,
}

impl FsmContext {
    pub fn new(storage: Arc<dyn Storage>, key: StorageKey) -> Self {
        Self { storage, key }
    }

    /// The key this context reads and writes.
    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    /// The underlying storage.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// A sibling context over the same conversation under another
    /// destiny, for running independent flows side by side.
    pub fn with_destiny(&self, destiny: impl Into<Arc<str>>) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            key: self.key.clone().with_destiny(destiny),
        }
    }

    pub async fn get_state(&self) -> StorageResult<Option<String>> {
        self.storage.get_state(&self.key).await
    }

    /// Writes the state; passing a stateless value clears it.
    pub async fn set_state(&self, state: impl IntoStateValue) -> StorageResult<()> {
        let state = state.into_state_value();
        self.storage.set_state(&self.key, state.as_deref()).await
    }

    pub async fn get_data(&self) -> StorageResult<StateData> {
        self.storage.get_data(&self.key).await
    }

    pub async fn set_data(&self, data: StateData) -> StorageResult<()> {
        self.storage.set_data(&self.key, data).await
    }

    /// Merges `data` over what is stored and returns the result.
    pub async fn update_data(&self, data: StateData) -> StorageResult<StateData> {
        self.storage.update_data(&self.key, data).await
    }

    pub async fn get_value(&self, field: &str) -> StorageResult<Option<Value>> {
        self.storage.get_value(&self.key, field).await
    }

    /// Replaces the data with a serialized struct or map.
    pub async fn set_typed_data<T: Serialize>(&self, value: &T) -> StorageResult<()> {
        self.set_data(to_state_data(value)?).await
    }

    /// Merges a serialized struct or map over the stored data.
    pub async fn update_typed_data<T: Serialize>(&self, value: &T) -> StorageResult<StateData> {
        self.update_data(to_state_data(value)?).await
    }

    /// Reads the whole data mapping into a typed value.
    pub async fn get_typed_data<T: DeserializeOwned>(&self) -> StorageResult<T> {
        let data = self.get_data().await?;
        Ok(serde_json::from_value(Value::Object(
            data.into_iter().collect(),
        ))?)
    }

    /// Removes the state and the data, leaving the context as if it
    /// had never been seen.
    pub async fn clear(&self) -> StorageResult<()> {
        self.set_state(None::<State>).await?;
        self.set_data(StateData::new()).await
    }
}

impl std::fmt::Debug for FsmContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsmContext").field("key", &self.key).finish()
    }
}

impl FromContext for FsmContext {
    fn from_context(ctx: &EventContext) -> ExtractResult<Self> {
        ctx.get::<FsmContext>()
            .ok_or_else(ExtractError::missing::<FsmContext>)
    }
}
