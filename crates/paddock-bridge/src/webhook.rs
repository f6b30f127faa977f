//! Approval-workflow webhook events.
//!
//! The approval platform POSTs a JSON event when a process instance changes
//! state. Only completed instances of the VM-request process reach the
//! provisioner; their form fields map directly onto a [`VmSpec`].

use paddock_core::VmSpec;
use serde::Deserialize;
use thiserror::Error;

/// Event type carrying approval-instance state changes.
pub const APPROVAL_EVENT_TYPE: &str = "bpms_instance_change";

/// Instance status meaning the approval chain finished successfully.
pub const COMPLETED_STATUS: &str = "COMPLETED";

/// Top-level webhook event.
#[derive(Debug, Deserialize)]
pub struct ApprovalEvent {
    #[serde(rename = "EventType", default)]
    pub event_type: String,
    #[serde(rename = "processInstance")]
    pub process_instance: Option<ProcessInstance>,
}

/// One approval process instance.
#[derive(Debug, Deserialize)]
pub struct ProcessInstance {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "formComponentValues", default)]
    pub form_values: Vec<FormValue>,
}

/// One submitted form field.
#[derive(Debug, Deserialize)]
pub struct FormValue {
    pub name: String,
    pub value: String,
}

/// Rejection reasons for an event that reached us but cannot be mapped.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing form field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

fn field<'a>(instance: &'a ProcessInstance, name: &'static str) -> Result<&'a str, WebhookError> {
    instance
        .form_values
        .iter()
        .find(|form| form.name == name)
        .map(|form| form.value.as_str())
        .ok_or(WebhookError::MissingField(name))
}

fn numeric_field(instance: &ProcessInstance, name: &'static str) -> Result<u32, WebhookError> {
    let raw = field(instance, name)?;
    raw.trim()
        .parse()
        .map_err(|_| WebhookError::InvalidField {
            field: name,
            value: raw.to_string(),
        })
}

/// Map a completed instance's form fields onto a [`VmSpec`].
///
/// Field names follow the request form: `host`, `vm_id`, `name`, `cpu`,
/// `memory_mb`, `disk_gb`, `gpu_pci_id`.
pub fn vm_spec_from_form(instance: &ProcessInstance) -> Result<VmSpec, WebhookError> {
    Ok(VmSpec {
        host: field(instance, "host")?.to_string(),
        vmid: numeric_field(instance, "vm_id")?,
        name: field(instance, "name")?.to_string(),
        cores: numeric_field(instance, "cpu")?,
        memory_mb: numeric_field(instance, "memory_mb")?,
        disk_gb: numeric_field(instance, "disk_gb")?,
        gpu_pci_id: field(instance, "gpu_pci_id")?.to_string(),
    })
}
