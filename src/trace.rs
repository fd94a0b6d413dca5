/// Optional export of pipeline runs to a LangSmith-compatible tracing service.
///
/// Export is best-effort: a failing sink is logged and never affects the
/// answer.
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::TracingConfig;
use crate::error::{RagError, Result};
use crate::http;

/// One traced invocation of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub name: String,
    pub run_type: String,
    pub inputs: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
}

impl RunRecord {
    /// Start a `chain` run now; `end_time` is set by [`RunRecord::finish`].
    #[must_use]
    pub fn start(name: &str, inputs: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            run_type: "chain".to_string(),
            inputs,
            outputs: None,
            error: None,
            start_time: now,
            end_time: now,
            session_name: None,
        }
    }

    pub fn finish(&mut self, outcome: std::result::Result<Value, String>) {
        self.end_time = Utc::now();
        match outcome {
            Ok(outputs) => self.outputs = Some(outputs),
            Err(error) => self.error = Some(error),
        }
    }
}

pub trait TraceSink: Send + Sync {
    fn submit(&self, run: &RunRecord) -> Result<()>;
}

/// Posts runs to `{endpoint}/runs` with an `x-api-key` header.
pub struct LangSmithSink {
    client: Client,
    url: String,
    api_key: String,
    project: String,
}

impl LangSmithSink {
    pub fn new(cfg: &TracingConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RagError::config("LANGCHAIN_API_KEY is not set"))?;

        Ok(Self {
            client: http::build_client(std::time::Duration::from_secs(10))?,
            url: http::endpoint(&cfg.endpoint, "runs"),
            api_key,
            project: cfg.project.clone(),
        })
    }
}

impl TraceSink for LangSmithSink {
    fn submit(&self, run: &RunRecord) -> Result<()> {
        let mut run = run.clone();
        if run.session_name.is_none() {
            run.session_name = Some(self.project.clone());
        }

        let resp = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .json(&run)
            .send()
            .map_err(|e| RagError::service(format!("trace export failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(RagError::service(format!(
                "trace export returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
