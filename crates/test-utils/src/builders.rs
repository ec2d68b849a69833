// crates/test-utils/src/builders.rs

use std::sync::Arc;
use std::time::Duration;

use distmake::cluster::NodePool;
use distmake::config::Settings;

/// Builder for Makefile text, so tests don't have to get tabs right.
#[derive(Debug, Default)]
pub struct MakefileBuilder {
    text: String,
}

impl MakefileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, target: &str, deps: &[&str], commands: &[&str]) -> Self {
        self.text.push_str(target);
        self.text.push(':');
        for dep in deps {
            self.text.push(' ');
            self.text.push_str(dep);
        }
        self.text.push('\n');
        for command in commands {
            self.text.push('\t');
            self.text.push_str(command);
            self.text.push('\n');
        }
        self
    }

    /// A rule with no commands: an input that already exists.
    pub fn artifact(self, name: &str) -> Self {
        self.rule(name, &[], &[])
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.text.push_str("# ");
        self.text.push_str(text);
        self.text.push('\n');
        self
    }

    pub fn build(self) -> String {
        self.text
    }
}

/// Default settings with timings shrunk for tests: 10 ms polls, 5 ms
/// backoff with 5 ms jitter, a 10 s run timeout.
pub fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    settings.scheduler.poll_interval = Duration::from_millis(10);
    settings.scheduler.run_timeout = Duration::from_secs(10);
    settings.dispatch.retry_base = Duration::from_millis(5);
    settings.dispatch.retry_jitter = Duration::from_millis(5);
    settings.dispatch.connect_timeout = Duration::from_millis(500);
    settings
}

/// Node pool from a node list, using default limits.
pub fn pool_of(spec: &str) -> Arc<NodePool> {
    let settings = Settings::default();
    Arc::new(NodePool::from_spec(spec, &settings.pool).expect("valid node list"))
}
