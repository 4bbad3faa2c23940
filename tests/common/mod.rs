//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rowmap::{Executor, MapError, MapResult, Rows, Value};

/// An executor that records every statement and answers queries from a
/// queue of canned row sets.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    statements: Vec<(String, Vec<Value>)>,
    responses: VecDeque<Rows>,
    failure: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the rows returned by the next query.
    pub fn respond(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        self.state.lock().unwrap().responses.push_back(Rows {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        });
    }

    /// Make every following statement fail with `message`.
    pub fn fail(&self, message: &str) {
        self.state.lock().unwrap().failure = Some(message.to_string());
    }

    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn last(&self) -> (String, Vec<Value>) {
        self.statements()
            .pop()
            .expect("no statement was executed")
    }

    fn record(&self, sql: &str, args: &[Value]) -> MapResult<()> {
        let mut state = self.state.lock().unwrap();
        state.statements.push((sql.to_string(), args.to_vec()));
        match &state.failure {
            Some(message) => Err(MapError::Execution(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn exec(&self, sql: &str, args: &[Value]) -> MapResult<u64> {
        self.record(sql, args)?;
        Ok(1)
    }

    async fn query(&self, sql: &str, args: &[Value]) -> MapResult<Rows> {
        self.record(sql, args)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .responses
            .pop_front()
            .unwrap_or_default())
    }
}

pub fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}
