//! Pipeworks demo host
//!
//! Builds the pipes described by a configuration file (or the built-in demo
//! topology), gives every input pipe a channel-backed listener drained on its
//! own thread, then pushes a few sample messages through each output pipe.
//!
//! ```text
//! pipeworks [CONFIG.toml]
//! pipeworks --print-default
//! ```

use anyhow::Context;
use crossbeam_channel::Receiver;
use pipeworks::{
    config::PipeworksConfig,
    logging,
    pipeline::{
        Message, PipeListener, PipeMessage, PipelineBuilder, PipelineError, QueueControl,
        PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MED,
    },
};
use serde_json::json;
use std::thread::JoinHandle;

fn main() -> anyhow::Result<()> {
    let arg = std::env::args().nth(1);

    if arg.as_deref() == Some("--print-default") {
        print!("{}", PipeworksConfig::demo().to_toml_string()?);
        return Ok(());
    }

    let config = match &arg {
        Some(path) => PipeworksConfig::load(path)
            .with_context(|| format!("Loading configuration from {}", path))?,
        None => PipeworksConfig::demo(),
    };

    let _log_guard = logging::init(&config.logging)?;
    tracing::info!("Starting Pipeworks");

    let built = PipelineBuilder::new()
        .build(&config)
        .context("Building pipelines")?;

    // One drain thread per input pipe
    let mut workers: Vec<JoinHandle<()>> = Vec::new();
    for module in built.module_names() {
        let Some(junction) = built.junction(&module) else {
            continue;
        };
        for pipe in junction.input_pipe_names() {
            let (tx, rx) = crossbeam_channel::unbounded();
            junction
                .add_pipe_listener(&pipe, PipeListener::channel(tx))
                .with_context(|| format!("Attaching listener to {}/{}", module, pipe))?;
            let module = module.clone();
            workers.push(std::thread::spawn(move || drain(module, pipe, rx)));
        }
    }

    for module in built.module_names() {
        let Some(junction) = built.junction(&module) else {
            continue;
        };
        for pipe in junction.output_pipe_names() {
            for message in sample_messages() {
                match junction.send_message(&pipe, message) {
                    Ok(()) => {}
                    Err(e @ PipelineError::Rejected { .. }) => {
                        tracing::info!(%module, %pipe, "{}", e)
                    }
                    Err(e) => tracing::warn!(%module, %pipe, "Send failed: {}", e),
                }
            }
            if let Err(e) = junction.send_message(&pipe, QueueControl::flush()) {
                tracing::debug!(%module, %pipe, "Flush not delivered: {}", e);
            }
        }
    }

    // Dropping the junctions drops the listeners and closes every channel
    drop(built);
    for worker in workers {
        if worker.join().is_err() {
            tracing::error!("Listener thread panicked");
        }
    }

    tracing::info!("Shutting down...");
    Ok(())
}

fn sample_messages() -> Vec<Message> {
    vec![
        Message::new()
            .with_priority(PRIORITY_LOW)
            .with_header(json!({"width": 4, "height": 3, "kind": "thumbnail"})),
        Message::new()
            .with_priority(PRIORITY_HIGH)
            .with_header(json!({"width": 64, "height": 48, "urgent": true})),
        Message::new()
            .with_priority(PRIORITY_MED)
            .with_header(json!({"width": 16, "height": 9}))
            .with_body(json!("hello")),
    ]
}

fn drain(module: String, pipe: String, rx: Receiver<PipeMessage>) {
    for message in rx {
        match message.as_message() {
            Some(m) => tracing::info!(
                %module,
                %pipe,
                priority = m.priority(),
                header = %m.header(),
                body = %m.body(),
                "Message received"
            ),
            None => tracing::info!(%module, %pipe, kind = %message.message_type(), "Control received"),
        }
    }
    tracing::debug!(%module, %pipe, "Listener closed");
}
