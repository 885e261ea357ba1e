use std::collections::VecDeque;

use parking_lot::Mutex;
use settle_bench_runner::prelude::SettleBenchResult;

use crate::command::{CommandRunner, Invocation};

enum Reply {
    Output(String),
    Failure(String),
}

/// Answers commands from a script instead of running them.
///
/// A reply is matched when its pattern is contained in the command line. Replies are used in the
/// order they were added and removed once used. Commands without a reply succeed with empty
/// output.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    once: Mutex<VecDeque<(String, Reply)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, pattern: &str, output: &str) -> Self {
        self.once
            .lock()
            .push_back((pattern.to_string(), Reply::Output(output.to_string())));
        self
    }

    pub(crate) fn fail(self, pattern: &str, message: &str) -> Self {
        self.once
            .lock()
            .push_back((pattern.to_string(), Reply::Failure(message.to_string())));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn output(&self, invocation: &Invocation) -> SettleBenchResult<String> {
        let command_line = invocation.to_string();
        self.calls.lock().push(command_line.clone());

        let mut once = self.once.lock();
        let reply = once
            .iter()
            .position(|(pattern, _)| command_line.contains(pattern.as_str()))
            .and_then(|index| once.remove(index));

        match reply {
            Some((_, Reply::Output(output))) => Ok(output),
            Some((_, Reply::Failure(message))) => Err(anyhow::anyhow!(message)),
            None => Ok(String::new()),
        }
    }
}
