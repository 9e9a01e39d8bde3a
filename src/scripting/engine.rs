//! Rhai Script Engine Implementation
//!
//! Runs filter scripts against pipeline messages. Message contents cross the
//! boundary through `rhai::serde`, so scripts see headers and bodies as
//! ordinary Rhai maps and arrays.

use crate::error::Result;
use crate::pipeline::{
    filter_fn, FilterFn, Message, PipelineError, PipelineResult, PRIORITY_HIGH, PRIORITY_LOW,
    PRIORITY_MED,
};
use crate::scripting::{create_shared_cache, CompiledScript, SharedScriptCache};
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{Dynamic, Engine, Scope};
use serde_json::Value;
use std::sync::{Arc, PoisonError};

fn script_error(name: &str, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::Script(format!("{}: {}", name, err))
}

/// The script engine used by every script-backed filter
pub struct ScriptEngine {
    /// The Rhai engine instance
    engine: Engine,
    /// Cache of compiled scripts
    cache: SharedScriptCache,
}

impl ScriptEngine {
    /// Create a new script engine with default configuration
    pub fn new() -> Self {
        Self::with_cache(create_shared_cache())
    }

    /// Create a new script engine with a shared cache
    pub fn with_cache(cache: SharedScriptCache) -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);
        Self { engine, cache }
    }

    /// Configure the Rhai engine with helper functions and safety limits
    fn configure_engine(engine: &mut Engine) {
        // Set safety limits
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(10_000);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(1_000);

        engine.register_fn("log", |text: &str| {
            tracing::debug!(target: "pipeworks::script", "{}", text);
        });
    }

    /// Compile (or fetch from cache) a script
    pub fn compile(&self, name: &str, source: &str) -> Result<CompiledScript> {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_compile(&self.engine, name, source)
    }

    /// Check that a script compiles, without caching it
    pub fn validate(&self, source: &str) -> Result<()> {
        self.engine.compile(source)?;
        Ok(())
    }

    /// Run a filter script against `message`.
    ///
    /// Returns the script's verdict. When the script accepts, the scope's
    /// `header`, `body` and `priority` are written back into the message.
    pub fn run_filter(
        &self,
        script: &CompiledScript,
        message: &Message,
        params: Option<&Value>,
    ) -> PipelineResult<bool> {
        let name = script.name();
        let envelope = message.snapshot();

        let mut scope = Scope::new();
        scope.push_constant("PRIORITY_HIGH", PRIORITY_HIGH as i64);
        scope.push_constant("PRIORITY_MED", PRIORITY_MED as i64);
        scope.push_constant("PRIORITY_LOW", PRIORITY_LOW as i64);
        let header = to_dynamic(&envelope.header).map_err(|e| script_error(name, e))?;
        scope.push_dynamic("header", header);
        let body = to_dynamic(&envelope.body).map_err(|e| script_error(name, e))?;
        scope.push_dynamic("body", body);
        let params = match params {
            Some(params) => to_dynamic(params).map_err(|e| script_error(name, e))?,
            None => Dynamic::UNIT,
        };
        scope.push_dynamic("params", params);
        scope.push("priority", envelope.priority as i64);

        let verdict = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, script.ast())
            .map_err(|e| script_error(name, e))?;
        let accept = verdict.as_bool().map_err(|type_name| {
            script_error(name, format!("filter must return a bool, got {}", type_name))
        })?;

        if accept {
            let header = Self::read_back(&scope, "header", name)?;
            let body = Self::read_back(&scope, "body", name)?;
            let priority = scope
                .get_value::<i64>("priority")
                .ok_or_else(|| script_error(name, "priority must stay an integer"))?;
            let priority = i32::try_from(priority)
                .map_err(|_| script_error(name, "priority out of range"))?;
            message.update(|env| {
                env.header = header;
                env.body = body;
                env.priority = priority;
            });
        }

        Ok(accept)
    }

    fn read_back(scope: &Scope, key: &str, name: &str) -> PipelineResult<Value> {
        let value = scope
            .get_value::<Dynamic>(key)
            .unwrap_or(Dynamic::UNIT);
        if value.is_unit() {
            return Ok(Value::Null);
        }
        from_dynamic::<Value>(&value).map_err(|e| script_error(name, e))
    }

    /// Get the underlying Rhai engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Get the script cache
    pub fn cache(&self) -> &SharedScriptCache {
        &self.cache
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled script bound to the engine that runs it.
#[derive(Clone)]
pub struct ScriptFilter {
    engine: Arc<ScriptEngine>,
    script: CompiledScript,
}

impl ScriptFilter {
    /// Compile `source` on a private engine.
    pub fn compile(name: &str, source: &str) -> Result<Self> {
        Self::with_engine(Arc::new(ScriptEngine::new()), name, source)
    }

    /// Compile `source` on a shared engine (and its cache).
    pub fn with_engine(engine: Arc<ScriptEngine>, name: &str, source: &str) -> Result<Self> {
        let script = engine.compile(name, source)?;
        Ok(Self { engine, script })
    }

    pub fn name(&self) -> &str {
        self.script.name()
    }

    pub fn source(&self) -> &str {
        self.script.source()
    }

    pub fn evaluate(&self, message: &Message, params: Option<&Value>) -> PipelineResult<bool> {
        self.engine.run_filter(&self.script, message, params)
    }

    /// Turn this script into a function a [`Filter`](crate::pipeline::Filter) can run.
    pub fn into_filter_fn(self) -> FilterFn {
        filter_fn(move |message, params| self.evaluate(message, params))
    }
}

impl std::fmt::Debug for ScriptFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptFilter")
            .field("script", &self.script)
            .finish()
    }
}
