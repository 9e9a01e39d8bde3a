//! Builds junctions and fitting chains from a [`PipeworksConfig`].
//!
//! Every `[[pipes]]` entry becomes one fitting (a bare fitting for a single
//! element chain, a [`PipeChain`] otherwise) registered on the junction of
//! each listed module. Junctions are created on first mention.

use crate::config::{FittingConfig, PipeConfig, PipeworksConfig};
use crate::error::{PipeworksError, Result, ResultExt};
use crate::pipeline::fitting::FittingRef;
use crate::pipeline::fittings::{Filter, Pipe, PipeChain, Queue, TeeSplit};
use crate::pipeline::junction::Junction;
use crate::scripting::{ScriptEngine, ScriptFilter};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a build: one junction per module plus every pipe by name.
#[derive(Default)]
pub struct BuiltPipelines {
    pub junctions: HashMap<String, Arc<Junction>>,
    pub pipes: HashMap<String, FittingRef>,
}

impl BuiltPipelines {
    pub fn junction(&self, module: &str) -> Option<Arc<Junction>> {
        self.junctions.get(module).cloned()
    }

    pub fn pipe(&self, name: &str) -> Option<FittingRef> {
        self.pipes.get(name).cloned()
    }

    /// Module names, sorted
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.junctions.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for BuiltPipelines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut pipes: Vec<&String> = self.pipes.keys().collect();
        pipes.sort();
        f.debug_struct("BuiltPipelines")
            .field("modules", &self.module_names())
            .field("pipes", &pipes)
            .finish()
    }
}

/// Turns configuration into live fittings. Filter scripts share one engine
/// (and its compile cache).
pub struct PipelineBuilder {
    engine: Arc<ScriptEngine>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::with_engine(Arc::new(ScriptEngine::new()))
    }

    pub fn with_engine(engine: Arc<ScriptEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<ScriptEngine> {
        &self.engine
    }

    pub fn build(&self, config: &PipeworksConfig) -> Result<BuiltPipelines> {
        config.validate()?;

        let mut built = BuiltPipelines::default();
        for pipe in &config.pipes {
            let fitting = self
                .build_pipe(pipe)
                .with_context(|| format!("Failed to build pipe '{}'", pipe.name))?;

            for endpoint in &pipe.endpoints {
                let junction = built
                    .junctions
                    .entry(endpoint.module.clone())
                    .or_insert_with(|| Arc::new(Junction::new()));
                junction
                    .register_pipe_str(pipe.name.clone(), &endpoint.direction, fitting.clone())
                    .with_context(|| {
                        format!(
                            "Failed to register pipe '{}' on module '{}'",
                            pipe.name, endpoint.module
                        )
                    })?;
            }

            built.pipes.insert(pipe.name.clone(), fitting);
        }

        tracing::info!(
            modules = built.junctions.len(),
            pipes = built.pipes.len(),
            "Pipelines built"
        );
        Ok(built)
    }

    /// Build the fitting for one pipe entry
    pub fn build_pipe(&self, pipe: &PipeConfig) -> Result<FittingRef> {
        let fittings = pipe
            .chain
            .iter()
            .map(|fitting| self.build_fitting(fitting))
            .collect::<Result<Vec<_>>>()?;

        if fittings.len() == 1 {
            if let Some(only) = fittings.into_iter().next() {
                return Ok(only);
            }
            return Err(PipeworksError::Config(format!(
                "Pipe '{}' lost its only fitting",
                pipe.name
            )));
        }

        match PipeChain::link(fittings)? {
            Some(chain) => {
                tracing::debug!(pipe = %pipe.name, fittings = chain.len(), "Chain linked");
                Ok(Arc::new(chain))
            }
            None => Ok(Pipe::shared()),
        }
    }

    /// Build a single fitting
    pub fn build_fitting(&self, config: &FittingConfig) -> Result<FittingRef> {
        let fitting: FittingRef = match config {
            FittingConfig::Pipe => Pipe::shared(),
            FittingConfig::Filter {
                name,
                script,
                params,
                mode,
            } => {
                let mut filter = Filter::new(name.clone()).with_mode(*mode);
                if let Some(source) = script {
                    let script = ScriptFilter::with_engine(self.engine.clone(), name, source)
                        .with_context(|| format!("Failed to compile filter '{}'", name))?;
                    filter = filter.with_filter(script.into_filter_fn());
                }
                if let Some(params) = params {
                    filter = filter.with_params(params.clone());
                }
                Arc::new(filter)
            }
            FittingConfig::Queue { mode } => Arc::new(Queue::new().with_mode(*mode)),
            FittingConfig::Split => Arc::new(TeeSplit::new()),
        };
        Ok(fitting)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::pipeline::{
        FilterMode, Message, PipeDirection, PipeListener, PipeMessage, PipelineError,
        QueueControl, QueueMode,
    };
    use serde_json::json;
    use std::sync::Mutex;

    fn pipe_config(name: &str, chain: Vec<FittingConfig>) -> PipeConfig {
        PipeConfig {
            name: name.to_string(),
            endpoints: vec![
                EndpointConfig::new("shell", "output"),
                EndpointConfig::new("logger", "input"),
            ],
            chain,
        }
    }

    fn recorder() -> (PipeListener, Arc<Mutex<Vec<PipeMessage>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener = PipeListener::new(move |m| sink.lock().unwrap().push(m));
        (listener, seen)
    }

    #[test]
    fn test_demo_topology() {
        let built = PipelineBuilder::new()
            .build(&PipeworksConfig::demo())
            .unwrap();
        assert_eq!(built.module_names(), vec!["logger", "shell"]);

        let shell = built.junction("shell").unwrap();
        let logger = built.junction("logger").unwrap();
        assert!(shell.has_output_pipe("to-logger"));
        assert!(logger.has_input_pipe("to-logger"));

        let (listener, seen) = recorder();
        logger.add_pipe_listener("to-logger", listener).unwrap();

        let msg = Message::new().with_header(json!({"width": 10, "height": 2}));
        shell.send_message("to-logger", msg.clone()).unwrap();
        assert!(seen.lock().unwrap().is_empty());

        shell
            .send_message("to-logger", QueueControl::flush())
            .unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(msg.header(), json!({"width": 100, "height": 20}));
    }

    #[test]
    fn test_empty_chain_is_plain_pipe() {
        let config = PipeworksConfig {
            pipes: vec![pipe_config("events", Vec::new())],
            ..Default::default()
        };
        let built = PipelineBuilder::new().build(&config).unwrap();
        let logger = built.junction("logger").unwrap();
        let (listener, seen) = recorder();
        logger.add_pipe_listener("events", listener).unwrap();

        built
            .junction("shell")
            .unwrap()
            .send_message("events", Message::new())
            .unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_rejecting_script_reaches_sender() {
        let config = PipeworksConfig {
            pipes: vec![pipe_config(
                "gate",
                vec![FittingConfig::Filter {
                    name: "gate".to_string(),
                    script: Some("false".to_string()),
                    params: None,
                    mode: FilterMode::Filter,
                }],
            )],
            ..Default::default()
        };
        let built = PipelineBuilder::new().build(&config).unwrap();
        let (listener, _seen) = recorder();
        built
            .junction("logger")
            .unwrap()
            .add_pipe_listener("gate", listener)
            .unwrap();

        let err = built
            .junction("shell")
            .unwrap()
            .send_message("gate", Message::new())
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::Rejected {
                filter: "gate".to_string()
            }
        );
    }

    #[test]
    fn test_split_feeds_several_listeners() {
        let config = PipeworksConfig {
            pipes: vec![pipe_config(
                "fanout",
                vec![
                    FittingConfig::Queue {
                        mode: QueueMode::Fifo,
                    },
                    FittingConfig::Split,
                ],
            )],
            ..Default::default()
        };
        let built = PipelineBuilder::new().build(&config).unwrap();
        let logger = built.junction("logger").unwrap();
        let (first, first_seen) = recorder();
        let (second, second_seen) = recorder();
        logger.add_pipe_listener("fanout", first).unwrap();
        logger.add_pipe_listener("fanout", second).unwrap();

        let shell = built.junction("shell").unwrap();
        shell.send_message("fanout", Message::new()).unwrap();
        shell.send_message("fanout", QueueControl::flush()).unwrap();

        assert_eq!(first_seen.lock().unwrap().len(), 1);
        assert_eq!(second_seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_bad_direction_is_reported() {
        let mut pipe = pipe_config("events", Vec::new());
        pipe.endpoints[0].direction = "sideways".to_string();
        let config = PipeworksConfig {
            pipes: vec![pipe],
            ..Default::default()
        };
        let err = PipelineBuilder::new().build(&config).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("module 'shell'"));
        assert!(text.contains("sideways"));
    }

    #[test]
    fn test_bad_script_is_reported() {
        let config = PipeworksConfig {
            pipes: vec![pipe_config(
                "broken",
                vec![FittingConfig::Filter {
                    name: "broken".to_string(),
                    script: Some("let x = ;".to_string()),
                    params: None,
                    mode: FilterMode::Filter,
                }],
            )],
            ..Default::default()
        };
        let err = PipelineBuilder::new().build(&config).unwrap_err();
        assert!(err.to_string().contains("pipe 'broken'"));
    }

    #[test]
    fn test_registered_direction() {
        let config = PipeworksConfig {
            pipes: vec![pipe_config("events", Vec::new())],
            ..Default::default()
        };
        let built = PipelineBuilder::new().build(&config).unwrap();
        assert_eq!(
            built.junction("shell").unwrap().pipe_direction("events"),
            Some(PipeDirection::Output)
        );
        assert!(built.pipe("events").is_some());
    }
}
