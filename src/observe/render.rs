//! Conditional views over an observer's state.

use super::observer::Observer;
use super::state::AgentState;
use crate::Error;
use std::fmt;
use std::sync::Arc;

/// Which classification a view's children are meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Agent,
    Human,
}

impl Audience {
    pub fn admits(self, is_agent_client_hint: bool) -> bool {
        match self {
            Audience::Agent => is_agent_client_hint,
            Audience::Human => !is_agent_client_hint,
        }
    }
}

/// Shown in the error phase: a fixed value, or one built from the error.
pub enum ErrorPlaceholder<T> {
    Value(T),
    Render(Arc<dyn Fn(&Error) -> T + Send + Sync>),
}

impl<T> ErrorPlaceholder<T> {
    pub fn render_with<F>(f: F) -> Self
    where
        F: Fn(&Error) -> T + Send + Sync + 'static,
    {
        ErrorPlaceholder::Render(Arc::new(f))
    }
}

impl<T: Clone> ErrorPlaceholder<T> {
    pub fn resolve(&self, error: &Error) -> T {
        match self {
            ErrorPlaceholder::Value(value) => value.clone(),
            ErrorPlaceholder::Render(render) => render(error),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ErrorPlaceholder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPlaceholder::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ErrorPlaceholder::Render(_) => f.write_str("Render(..)"),
        }
    }
}

/// Content for a conditional view. Placeholders are opaque and surfaced unchanged.
#[derive(Debug)]
pub struct ViewProps<T> {
    pub children: T,
    pub loading: Option<T>,
    pub error: Option<ErrorPlaceholder<T>>,
}

impl<T> ViewProps<T> {
    pub fn new(children: T) -> Self {
        Self {
            children,
            loading: None,
            error: None,
        }
    }

    pub fn loading(mut self, placeholder: T) -> Self {
        self.loading = Some(placeholder);
        self
    }

    pub fn error(mut self, placeholder: T) -> Self {
        self.error = Some(ErrorPlaceholder::Value(placeholder));
        self
    }

    pub fn error_with<F>(mut self, render: F) -> Self
    where
        F: Fn(&Error) -> T + Send + Sync + 'static,
    {
        self.error = Some(ErrorPlaceholder::render_with(render));
        self
    }
}

/// Pick what to show for `state`. `None` means render nothing.
///
/// Children are suppressed in every phase except a success whose hint matches the
/// audience.
pub fn select<T: Clone>(audience: Audience, state: &AgentState, props: &ViewProps<T>) -> Option<T> {
    match state {
        AgentState::Loading => props.loading.clone(),
        AgentState::Error(e) => props.error.as_ref().map(|p| p.resolve(e)),
        AgentState::Success(result) if audience.admits(result.is_agent_client_hint) => {
            Some(props.children.clone())
        }
        AgentState::Success(_) => None,
    }
}

/// A view that owns one observer and shows its children only to one audience.
pub struct ConditionalView<T> {
    audience: Audience,
    props: ViewProps<T>,
    observer: Observer,
}

impl<T: Clone> ConditionalView<T> {
    pub(crate) fn new(audience: Audience, props: ViewProps<T>, observer: Observer) -> Self {
        Self {
            audience,
            props,
            observer,
        }
    }

    pub fn audience(&self) -> Audience {
        self.audience
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    /// Render the current phase, triggering the request on first use.
    pub fn render(&mut self) -> Option<T> {
        self.observer.activate();
        select(self.audience, &self.observer.state(), &self.props)
    }

    /// Render once the classification has settled.
    pub async fn render_settled(&mut self) -> Option<T> {
        let state = self.observer.settled().await;
        select(self.audience, &state, &self.props)
    }
}
