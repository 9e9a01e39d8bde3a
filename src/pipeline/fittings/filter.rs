//! Filter: Named fitting that transforms or drops normal messages.
//!
//! Runs its filter function over every normal message and forwards the
//! (possibly rewritten) message only if the function accepts it. Its mode,
//! parameters and function can be replaced while the pipeline is live by
//! writing a [`FilterControl`] addressed to the filter's name. Control
//! messages addressed to other filters, and anything else the filter has no
//! business with, pass through untouched.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::fitting::{Fitting, FittingRef, OutputSlot};
use crate::pipeline::message::{
    filter_fn, FilterControl, FilterControlKind, FilterFn, PipeMessage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{PoisonError, RwLock};

/// Operating mode of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Apply the filter function to normal messages.
    #[default]
    Filter,
    /// Pass normal messages through unfiltered.
    Bypass,
}

struct FilterState {
    mode: FilterMode,
    filter: FilterFn,
    params: Option<Value>,
}

fn accept_all() -> FilterFn {
    filter_fn(|_, _| Ok(true))
}

/// A named, runtime-reconfigurable filter.
pub struct Filter {
    name: String,
    state: RwLock<FilterState>,
    output: OutputSlot,
}

impl Filter {
    /// Create a filter that accepts everything until given a function.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(FilterState {
                mode: FilterMode::Filter,
                filter: accept_all(),
                params: None,
            }),
            output: OutputSlot::new(),
        }
    }

    pub fn with_filter(self, filter: FilterFn) -> Self {
        self.set_filter(Some(filter));
        self
    }

    pub fn with_params(self, params: Value) -> Self {
        self.set_params(Some(params));
        self
    }

    pub fn with_mode(self, mode: FilterMode) -> Self {
        self.set_mode(mode);
        self
    }

    /// Connect `output` while building. Only the first call takes effect.
    pub fn with_output(self, output: FittingRef) -> Self {
        let connected = self.output.connect(output);
        debug_assert!(connected.is_ok(), "Filter output already set");
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> FilterMode {
        self.state.read().unwrap_or_else(PoisonError::into_inner).mode
    }

    pub fn set_mode(&self, mode: FilterMode) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).mode = mode;
    }

    pub fn params(&self) -> Option<Value> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .params
            .clone()
    }

    pub fn set_params(&self, params: Option<Value>) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).params = params;
    }

    /// Replace the filter function. `None` restores the accept-all default.
    pub fn set_filter(&self, filter: Option<FilterFn>) {
        self.state.write().unwrap_or_else(PoisonError::into_inner).filter =
            filter.unwrap_or_else(accept_all);
    }

    fn apply_control(&self, control: FilterControl) {
        tracing::debug!(filter = %self.name, kind = ?control.kind, "Filter control applied");
        match control.kind {
            FilterControlKind::SetParams => self.set_params(control.params),
            FilterControlKind::SetFilter => self.set_filter(control.filter),
            FilterControlKind::Bypass => self.set_mode(FilterMode::Bypass),
            FilterControlKind::Filter => self.set_mode(FilterMode::Filter),
        }
    }

    fn filter_normal(&self, message: PipeMessage) -> PipelineResult<()> {
        let (mode, filter, params) = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            (state.mode, state.filter.clone(), state.params.clone())
        };

        if mode == FilterMode::Bypass {
            return self.output.write(message);
        }

        let verdict = match message.as_message() {
            Some(envelope) => filter(envelope, params.as_ref()),
            None => Ok(true),
        };

        match verdict {
            Ok(true) => self.output.write(message),
            Ok(false) => {
                tracing::debug!(filter = %self.name, "Message rejected");
                Err(PipelineError::Rejected {
                    filter: self.name.clone(),
                })
            }
            Err(e) => {
                tracing::warn!(filter = %self.name, "Filter function failed: {}", e);
                Err(PipelineError::FilterFailed {
                    filter: self.name.clone(),
                    message: e.to_string(),
                })
            }
        }
    }
}

impl Fitting for Filter {
    fn connect(&self, output: FittingRef) -> PipelineResult<()> {
        self.output.connect(output)?;
        tracing::debug!(filter = %self.name, "Filter connected");
        Ok(())
    }

    fn disconnect(&self) -> Option<FittingRef> {
        self.output.disconnect()
    }

    fn write(&self, message: PipeMessage) -> PipelineResult<()> {
        match message {
            PipeMessage::Normal(_) => self.filter_normal(message),
            PipeMessage::FilterControl(control) if control.target == self.name => {
                self.apply_control(control);
                Ok(())
            }
            other => self.output.write(other),
        }
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.name)
            .field("mode", &self.mode())
            .field("params", &self.params())
            .field("output", &self.output)
            .finish()
    }
}
