//! Process models
//!
//! A process (platform "PO item") is made of two asynchronous sub-processes: encoding
//! (`workflow_process`) and publishing (`publish_process`). The composite status is
//! derived from both, never stored.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::constants::{ENCODING_ACTION, PUBLISH_ACTION, VOD_CDN_BASE, VOD_OUTPUT_PREFIX};
use crate::error::{PlatformError, PlatformResult};

/// State of a single sub-process
///
/// States other than the three known ones are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProcessState {
    Running,
    Success,
    Error,
    Other(String),
}

impl ProcessState {
    pub fn as_str(&self) -> &str {
        match self {
            ProcessState::Running => "RUNNING",
            ProcessState::Success => "SUCCESS",
            ProcessState::Error => "ERROR",
            ProcessState::Other(s) => s,
        }
    }

    /// `SUCCESS` and `ERROR` are final
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Success | ProcessState::Error)
    }
}

impl From<String> for ProcessState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "RUNNING" => ProcessState::Running,
            "SUCCESS" => ProcessState::Success,
            "ERROR" => ProcessState::Error,
            _ => ProcessState::Other(s),
        }
    }
}

impl From<&str> for ProcessState {
    fn from(s: &str) -> Self {
        ProcessState::from(s.to_string())
    }
}

impl From<ProcessState> for String {
    fn from(state: ProcessState) -> Self {
        match state {
            ProcessState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sub-process record (encoding or publish)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubProcess {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub state: Option<ProcessState>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl SubProcess {
    pub fn is_terminal(&self) -> bool {
        self.state.as_ref().is_some_and(ProcessState::is_terminal)
    }
}

/// Pipeline stage reported by a composite status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Encoding,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Encoding => "ENCODING",
            Stage::Publish => "PUBLISH",
        }
    }
}

/// Composite status of a process, rendered as `{STAGE}_{STATE}` (e.g. `PUBLISH_SUCCESS`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStatus {
    pub stage: Stage,
    /// `None` when the sub-process record or its state is missing
    pub state: Option<ProcessState>,
}

impl ProcessStatus {
    pub fn new(stage: Stage, state: Option<ProcessState>) -> Self {
        Self { stage, state }
    }

    /// Whether the pipeline has finished, successfully or not
    pub fn is_complete(&self) -> bool {
        match (self.stage, &self.state) {
            (Stage::Publish, Some(state)) => state.is_terminal(),
            (Stage::Encoding, Some(ProcessState::Error)) => true,
            _ => false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.stage == Stage::Publish && self.state == Some(ProcessState::Success)
    }

    pub fn is_failed(&self) -> bool {
        self.state == Some(ProcessState::Error)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self
            .state
            .as_ref()
            .map(ProcessState::as_str)
            .unwrap_or("UNKNOWN");
        write!(f, "{}_{}", self.stage.as_str(), state)
    }
}

impl Serialize for ProcessStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A process (platform "PO item")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Process name, unique within its group
    #[serde(rename = "po_item_id")]
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "workflow_process", default)]
    pub encoding: Option<SubProcess>,
    #[serde(rename = "publish_process", default)]
    pub publish: Option<SubProcess>,
    #[serde(default)]
    pub input_brefix: Option<String>,
    #[serde(default)]
    pub output_brefix: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub po_destination: Option<String>,
    /// Remaining fields of the raw record (tracks, preview, checkpoints, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Process {
    fn encoding_state(&self) -> Option<&ProcessState> {
        self.encoding.as_ref().and_then(|s| s.state.as_ref())
    }

    fn publish_state(&self) -> Option<&ProcessState> {
        self.publish.as_ref().and_then(|s| s.state.as_ref())
    }

    /// Composite status
    ///
    /// While encoding is not terminal, the encoding state is reported; afterwards the
    /// publish state. A failed encoding without publish record stays `ENCODING_ERROR`
    /// since publishing never starts.
    pub fn status(&self) -> ProcessStatus {
        match self.encoding_state() {
            Some(state) if state.is_terminal() => match self.publish_state() {
                None if *state == ProcessState::Error => {
                    ProcessStatus::new(Stage::Encoding, Some(ProcessState::Error))
                }
                publish => ProcessStatus::new(Stage::Publish, publish.cloned()),
            },
            other => ProcessStatus::new(Stage::Encoding, other.cloned()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status().is_complete()
    }

    /// CDN base URL of the published output, ending in `/`
    pub fn content_url(&self) -> Option<String> {
        let output = self.output_brefix.as_deref()?;
        let segments: Vec<&str> = output.split('/').collect();
        let keep = segments.len().saturating_sub(2);
        let base = segments[..keep]
            .join("/")
            .replace(VOD_OUTPUT_PREFIX, VOD_CDN_BASE);
        Some(format!("{}/", base))
    }

    /// The sub-process whose state should be polled next, if any
    ///
    /// Encoding is polled until terminal, then publishing until terminal.
    pub fn pending_sub_process(&self) -> Option<&SubProcess> {
        match &self.encoding {
            Some(encoding) if !encoding.is_terminal() => Some(encoding),
            Some(_) => self.publish.as_ref().filter(|p| !p.is_terminal()),
            None => None,
        }
    }

    /// Replace the sub-process record matching the refreshed record's action.
    pub fn apply_refresh(&mut self, record: SubProcess) -> PlatformResult<()> {
        match record.action.as_deref() {
            Some(ENCODING_ACTION) => self.encoding = Some(record),
            Some(PUBLISH_ACTION) => self.publish = Some(record),
            other => {
                return Err(PlatformError::UnknownAction(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        }
        Ok(())
    }
}
