//! Rhai Scripting for Filter Functions
//!
//! Filters can be driven by a Rhai script instead of a Rust closure. This is
//! what makes filters declarable in configuration and replaceable at runtime
//! with a SET_FILTER control message carrying a freshly compiled script.
//!
//! ## Script Scope
//!
//! - `header` - The message header (maps, arrays, numbers, strings, `()` for null)
//! - `body` - The message body
//! - `params` - The filter's current parameters (`()` if none)
//! - `priority` - The message priority as an integer
//! - `PRIORITY_HIGH`, `PRIORITY_MED`, `PRIORITY_LOW` - Priority constants
//!
//! The script must evaluate to a bool: `true` forwards the message, `false`
//! drops it. If it accepts, any changes made to `header`, `body` or
//! `priority` are written back into the message.
//!
//! ## Helper Functions
//!
//! - `log(text)` - Emit a debug-level trace event tagged with the script name
//!
//! ## Example Scripts
//!
//! Scaling dimensions by a configured factor:
//! ```rhai
//! header.width *= params.factor;
//! header.height *= params.factor;
//! true
//! ```
//!
//! Dropping low priority traffic:
//! ```rhai
//! priority < PRIORITY_LOW
//! ```

mod engine;

pub use engine::{ScriptEngine, ScriptFilter};

use crate::error::Result;
use rhai::{Engine, AST};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A compiled filter script that can be executed efficiently
#[derive(Clone)]
pub struct CompiledScript {
    /// The compiled AST
    ast: AST,
    /// Script source code
    source: String,
    /// Name/identifier for this script
    name: String,
}

impl CompiledScript {
    /// Get the source code of this script
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the name of this script
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn ast(&self) -> &AST {
        &self.ast
    }
}

impl std::fmt::Debug for CompiledScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledScript")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// Cache for compiled scripts to avoid recompilation
#[derive(Default)]
pub struct ScriptCache {
    /// Map from script source to compiled script
    cache: HashMap<String, CompiledScript>,
}

impl ScriptCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Get a cached script or compile and cache it
    ///
    /// Entries are keyed by source; a hit keeps the name it was first compiled under.
    pub fn get_or_compile(
        &mut self,
        engine: &Engine,
        name: &str,
        source: &str,
    ) -> Result<CompiledScript> {
        if let Some(script) = self.cache.get(source) {
            return Ok(script.clone());
        }

        let ast = engine.compile(source)?;

        let script = CompiledScript {
            ast,
            source: source.to_string(),
            name: name.to_string(),
        };

        self.cache.insert(source.to_string(), script.clone());
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Remove a specific script from the cache
    pub fn invalidate(&mut self, source: &str) {
        self.cache.remove(source);
    }
}

/// Thread-safe script cache wrapper
pub type SharedScriptCache = Arc<RwLock<ScriptCache>>;

/// Create a new shared script cache
pub fn create_shared_cache() -> SharedScriptCache {
    Arc::new(RwLock::new(ScriptCache::new()))
}

/// Built-in filter scripts for common use cases
pub mod builtins {
    /// Accept every message unchanged
    pub const ACCEPT_ALL: &str = "true";

    /// Reject every message
    pub const REJECT_ALL: &str = "false";

    /// Multiply `header.width` and `header.height` by `params.factor`
    pub const SCALE_DIMENSIONS: &str = r#"
header.width *= params.factor;
header.height *= params.factor;
true
"#;

    /// Drop messages whose priority is lower than `params.min_priority`
    /// (numerically greater)
    pub const PRIORITY_GATE: &str = r#"
priority <= params.min_priority
"#;

    /// Promote messages flagged `header.urgent` to high priority
    pub const PROMOTE_URGENT: &str = r#"
if type_of(header) == "map" && header.urgent == true {
    priority = PRIORITY_HIGH;
}
true
"#;

    /// Get all built-in filter scripts as (name, source) pairs
    pub fn all() -> Vec<(&'static str, &'static str)> {
        vec![
            ("Accept All", ACCEPT_ALL),
            ("Reject All", REJECT_ALL),
            ("Scale Dimensions", SCALE_DIMENSIONS),
            ("Priority Gate", PRIORITY_GATE),
            ("Promote Urgent", PROMOTE_URGENT),
        ]
    }
}
