//! Test data builders for creating test objects

use pipeworks::config::{EndpointConfig, FittingConfig, PipeConfig};
use pipeworks::pipeline::{Envelope, Message};
use serde_json::{json, Value};

/// Builder for creating test Messages
pub struct MessageBuilder {
    priority: i32,
    header: Value,
    body: Value,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            priority: super::DEFAULT_PRIORITY,
            header: Value::Null,
            body: Value::Null,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn header(mut self, header: Value) -> Self {
        self.header = header;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Header `{width, height}`
    pub fn dimensions(self, width: i64, height: i64) -> Self {
        self.header(json!({"width": width, "height": height}))
    }

    pub fn build(self) -> Message {
        Message::from_envelope(Envelope {
            priority: self.priority,
            header: self.header,
            body: self.body,
        })
    }
}

/// Builder for a pipe running from `from` (output) to `to` (input)
pub struct PipeConfigBuilder {
    config: PipeConfig,
}

impl PipeConfigBuilder {
    pub fn new(name: &str, from: &str, to: &str) -> Self {
        Self {
            config: PipeConfig {
                name: name.to_string(),
                endpoints: vec![
                    EndpointConfig::new(from, "output"),
                    EndpointConfig::new(to, "input"),
                ],
                chain: Vec::new(),
            },
        }
    }

    pub fn fitting(mut self, fitting: FittingConfig) -> Self {
        self.config.chain.push(fitting);
        self
    }

    pub fn build(self) -> PipeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_builder() {
        let msg = MessageBuilder::new()
            .priority(1)
            .dimensions(3, 4)
            .body(json!("x"))
            .build();

        assert_eq!(msg.priority(), 1);
        assert_eq!(msg.header(), json!({"width": 3, "height": 4}));
        assert_eq!(msg.body(), json!("x"));
    }
}
