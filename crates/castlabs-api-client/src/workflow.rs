//! Workflow API: encoding jobs, their groups and webhooks
//!
//! Jobs are asynchronous. A freshly started workflow only shows up as a process after
//! a short delay, and its state advances on the platform; callers poll with
//! [`Workflow::refresh_state`] or register a webhook.

use std::time::Duration;

use castlabs_core::constants::{
    DEFAULT_DESTINATION, DEFAULT_FORMAT_SPECIFIC_DATA, DEFAULT_PROCESS_WAIT_SECS,
    DEFAULT_TEMPLATE,
};
use castlabs_core::models::GroupRecord;
use castlabs_core::{Api, PlatformError, PlatformResult, Process, StorageLocation, SubProcess};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};

use crate::queries::{
    GET_POS, GET_POS_OPERATION, GET_PROCESS, GET_PROCESS_OPERATION, PO_ITEM_LIST,
    PO_ITEM_LIST_OPERATION, REGISTER_WEBHOOK, REGISTER_WEBHOOK_OPERATION, START_WORKFLOW_VOD,
    START_WORKFLOW_VOD_OPERATION,
};
use crate::{ApiClient, GraphQlRequest};

/// Options for [`Workflow::create_vod_encoding`]
#[derive(Debug, Clone)]
pub struct EncodingOptions {
    /// Publish destination; `vod` is the CloudFront origin for VOD streaming
    pub destination: String,
    pub template: String,
    /// Extra workflow parameters as a JSON string
    pub format_specific_data: String,
    /// Publish as soon as encoding succeeds; disable to QC the output first
    pub auto_publish: bool,
    pub webhook_url: Option<String>,
    /// How long to wait for the process to appear
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            destination: DEFAULT_DESTINATION.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            format_specific_data: DEFAULT_FORMAT_SPECIFIC_DATA.to_string(),
            auto_publish: true,
            webhook_url: None,
            wait_timeout: Duration::from_secs(DEFAULT_PROCESS_WAIT_SECS),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct PoList<T> {
    #[serde(default)]
    pos: Vec<T>,
}

#[derive(Deserialize)]
struct PoItems {
    #[serde(default)]
    poitems: Vec<Process>,
}

/// Encoding and publishing jobs on the platform
#[derive(Clone, Debug)]
pub struct Workflow {
    client: ApiClient,
}

impl Workflow {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn po_name(&self, group_name: &str) -> String {
        GroupRecord::platform_name(self.client.organization_urn(), group_name)
    }

    /// Start a VOD encoding of `origin_folder` and wait for its process to appear.
    ///
    /// The workflow detects the master video and side-car files in the folder. With
    /// the default options the output is published for streaming through the CDN.
    pub async fn create_vod_encoding(
        &self,
        location: &StorageLocation,
        origin_folder: &str,
        group_name: &str,
        process_name: &str,
        options: &EncodingOptions,
    ) -> PlatformResult<Process> {
        serde_json::from_str::<Value>(&options.format_specific_data).map_err(|e| {
            PlatformError::InvalidInput(format!("format_specific_data must be valid JSON: {}", e))
        })?;

        if options.poll_interval.is_zero() {
            return Err(PlatformError::InvalidInput(
                "poll_interval must be greater than zero".to_string(),
            ));
        }

        let folder = location.location_with_path(origin_folder, true);
        let input_brefix = folder.strip_prefix("s3://").unwrap_or(&folder);

        tracing::info!(
            operation = START_WORKFLOW_VOD_OPERATION,
            input = %input_brefix,
            group = %group_name,
            process_id = %process_name,
            "Creating VOD encoding"
        );

        let request = GraphQlRequest::new(
            START_WORKFLOW_VOD_OPERATION,
            START_WORKFLOW_VOD,
            json!({
                "input_brefix": input_brefix,
                "po_item_id": process_name,
                "po_name": self.po_name(group_name),
                "po_destination": options.destination,
                "vtk_template": options.template,
                "auto_publish": options.auto_publish,
                "format_specific_data": options.format_specific_data,
            }),
        );
        let started: SubProcess = self
            .client
            .query_object(Api::Workflow, &request, START_WORKFLOW_VOD_OPERATION)
            .await?;
        tracing::debug!(
            workflow_id = ?started.id,
            state = ?started.state,
            "Workflow started"
        );

        let process = self
            .wait_for_process(group_name, process_name, options)
            .await?;

        if let Some(url) = &options.webhook_url {
            self.register_webhook(&process, url).await?;
        }

        Ok(process)
    }

    async fn wait_for_process(
        &self,
        group_name: &str,
        process_name: &str,
        options: &EncodingOptions,
    ) -> PlatformResult<Process> {
        let deadline = Instant::now() + options.wait_timeout;
        loop {
            match self.process(group_name, process_name).await {
                Ok(process) => return Ok(process),
                Err(PlatformError::ProcessNotFound { .. }) if Instant::now() < deadline => {
                    tracing::debug!(
                        group = %group_name,
                        process_id = %process_name,
                        "Process not created yet"
                    );
                    sleep(options.poll_interval).await;
                }
                Err(PlatformError::ProcessNotFound { .. }) => {
                    return Err(PlatformError::Timeout(format!(
                        "Timed out waiting for process {} in group {} to be created",
                        process_name, group_name
                    )))
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Names of all groups of the organization
    pub async fn groups(&self) -> PlatformResult<Vec<String>> {
        tracing::info!(operation = GET_POS_OPERATION, "Getting groups");
        let organization_urn = self.client.organization_urn();
        let request = GraphQlRequest::new(
            GET_POS_OPERATION,
            GET_POS,
            json!({ "airline": organization_urn }),
        );
        let list: PoList<GroupRecord> = self
            .client
            .query_object(Api::Workflow, &request, "list_POs")
            .await?;

        Ok(list
            .pos
            .iter()
            .map(|po| po.group_name(organization_urn))
            .collect())
    }

    async fn list_processes(&self, group_name: &str) -> PlatformResult<Vec<Process>> {
        tracing::info!(
            operation = PO_ITEM_LIST_OPERATION,
            group = %group_name,
            "Getting processes"
        );
        let request = GraphQlRequest::new(
            PO_ITEM_LIST_OPERATION,
            PO_ITEM_LIST,
            json!({ "po_name": self.po_name(group_name) }),
        );
        let list: PoList<PoItems> = self
            .client
            .query_object(Api::Workflow, &request, "list_POs")
            .await?;

        Ok(list
            .pos
            .into_iter()
            .next()
            .map(|po| po.poitems)
            .unwrap_or_default())
    }

    /// All processes of a group, with refreshed state; empty if the group does not exist
    pub async fn processes(&self, group_name: &str) -> PlatformResult<Vec<Process>> {
        let mut processes = self.list_processes(group_name).await?;
        for process in &mut processes {
            self.refresh_state(process).await?;
        }
        Ok(processes)
    }

    /// The process called `process_name` in a group, with refreshed state
    pub async fn process(&self, group_name: &str, process_name: &str) -> PlatformResult<Process> {
        // TODO: query the single PO item once the API offers a lookup by po_item_id
        let mut process = self
            .list_processes(group_name)
            .await?
            .into_iter()
            .find(|process| process.name == process_name)
            .ok_or_else(|| PlatformError::ProcessNotFound {
                group: group_name.to_string(),
                process: process_name.to_string(),
            })?;

        self.refresh_state(&mut process).await?;
        Ok(process)
    }

    /// Pull the latest record of the sub-process still in flight.
    pub async fn refresh_state(&self, process: &mut Process) -> PlatformResult<()> {
        let Some(pending) = process.pending_sub_process() else {
            return Ok(());
        };
        let Some(id) = pending.id.clone() else {
            tracing::debug!(
                process_id = %process.name,
                "Sub-process has no id yet, skipping refresh"
            );
            return Ok(());
        };

        tracing::info!(
            operation = GET_PROCESS_OPERATION,
            process_id = %id,
            "Refreshing process state"
        );
        let request =
            GraphQlRequest::new(GET_PROCESS_OPERATION, GET_PROCESS, json!({ "id": id }));
        let record: SubProcess = self
            .client
            .query_object(Api::Workflow, &request, "process")
            .await?;

        process.apply_refresh(record)
    }

    /// Register `url` for final (SUCCESS and ERROR) events of every sub-process.
    ///
    /// Returns the number of registrations made.
    pub async fn register_webhook(&self, process: &Process, url: &str) -> PlatformResult<usize> {
        let sub_processes = [("encoding", &process.encoding), ("publish", &process.publish)];
        let mut registered = 0;
        for (stage, sub_process) in sub_processes {
            let Some(sub_process) = sub_process else {
                tracing::warn!(
                    process_id = %process.name,
                    stage,
                    "Skipping webhook registration: sub-process is missing"
                );
                continue;
            };
            let Some(id) = sub_process.id.as_deref() else {
                tracing::warn!(
                    process_id = %process.name,
                    stage,
                    "Skipping webhook registration: sub-process has no id"
                );
                continue;
            };

            tracing::info!(
                operation = REGISTER_WEBHOOK_OPERATION,
                process_id = %id,
                "Registering webhook"
            );
            let request = GraphQlRequest::new(
                REGISTER_WEBHOOK_OPERATION,
                REGISTER_WEBHOOK,
                json!({ "input": { "process_id": id, "webhook_url": url } }),
            );
            let _: Value = self
                .client
                .query(Api::Workflow, &request, REGISTER_WEBHOOK_OPERATION)
                .await?;
            registered += 1;
        }
        Ok(registered)
    }
}
