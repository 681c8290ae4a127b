//! Scripted backend for tests.
//!
//! Responses are registered against an argument prefix. The longest
//! registered prefix matching a command wins; its queued responses are
//! consumed in order and the last one repeats. Unscripted `show` commands
//! fail with status 1 (resource absent), every other command succeeds.

use crate::backend::Backend;
use crate::error::Result;
use crate::types::CommandOutput;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub project: Option<String>,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl Call {
    /// Arguments joined with spaces, for readable assertions.
    pub fn line(&self) -> String {
        self.args.join(" ")
    }

    /// Whether this call only reads state.
    pub fn is_read(&self) -> bool {
        self.args.iter().any(|a| a == "show")
    }
}

#[derive(Debug)]
struct Rule {
    prefix: Vec<String>,
    responses: VecDeque<CommandOutput>,
}

/// Backend returning canned outputs and recording every call.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `output` for commands starting with `prefix`.
    pub fn respond(&self, prefix: &[&str], output: CommandOutput) -> &Self {
        let prefix: Vec<String> = prefix.iter().map(ToString::to_string).collect();
        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        match rules.iter_mut().find(|r| r.prefix == prefix) {
            Some(rule) => rule.responses.push_back(output),
            None => rules.push(Rule {
                prefix,
                responses: VecDeque::from([output]),
            }),
        }
        self
    }

    /// All calls in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Calls other than `show` lookups.
    pub fn mutating_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| !c.is_read()).collect()
    }

    /// Calls whose arguments start with `prefix`.
    pub fn calls_matching(&self, prefix: &[&str]) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| starts_with(&c.args, prefix))
            .collect()
    }

    fn next_response(&self, args: &[String]) -> CommandOutput {
        let mut rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        let best = rules
            .iter_mut()
            .filter(|r| starts_with(args, r.prefix.as_slice()))
            .max_by_key(|r| r.prefix.len());

        match best {
            Some(rule) if rule.responses.len() > 1 => {
                rule.responses.pop_front().unwrap_or_default()
            }
            Some(rule) => rule.responses.front().cloned().unwrap_or_default(),
            None if args.iter().any(|a| a == "show") => {
                CommandOutput::failed(1, "Error: Not Found\n")
            }
            None => CommandOutput::ok(""),
        }
    }
}

fn starts_with<S: AsRef<str>>(args: &[String], prefix: &[S]) -> bool {
    args.len() >= prefix.len() && args.iter().zip(prefix).all(|(a, p)| a == p.as_ref())
}

impl Backend for ScriptedBackend {
    fn execute(
        &self,
        project: Option<&str>,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call {
                project: project.map(str::to_string),
                args: args.to_vec(),
                stdin: stdin.map(str::to_string),
            });
        Ok(self.next_response(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split(' ').map(str::to_string).collect()
    }

    #[test]
    fn test_default_responses() {
        let backend = ScriptedBackend::new();
        let show = backend.execute(None, &args("profile show web"), None).unwrap();
        assert_eq!(show.status, 1);
        let create = backend.execute(None, &args("profile create web"), None).unwrap();
        assert!(create.success());
        assert_eq!(backend.mutating_calls().len(), 1);
    }

    #[test]
    fn test_queue_then_sticky_last() {
        let backend = ScriptedBackend::new();
        backend
            .respond(&["profile", "show"], CommandOutput::failed(1, "missing"))
            .respond(&["profile", "show"], CommandOutput::ok("config: {}\n"));

        let cmd = args("profile show web");
        assert_eq!(backend.execute(None, &cmd, None).unwrap().status, 1);
        assert!(backend.execute(None, &cmd, None).unwrap().success());
        assert!(backend.execute(None, &cmd, None).unwrap().success());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let backend = ScriptedBackend::new();
        backend
            .respond(&["storage"], CommandOutput::failed(2, "generic"))
            .respond(&["storage", "volume", "delete"], CommandOutput::ok(""));

        assert!(
            backend
                .execute(None, &args("storage volume delete default data"), None)
                .unwrap()
                .success()
        );
        assert_eq!(
            backend
                .execute(None, &args("storage volume create default data"), None)
                .unwrap()
                .status,
            2
        );
        assert_eq!(backend.calls_matching(&["storage", "volume"]).len(), 2);
    }
}
