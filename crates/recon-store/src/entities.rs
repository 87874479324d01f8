//! Typed rows for every entity in the asset graph, per the data model.

use chrono::{DateTime, Utc};
use recon_core::{DnsRecordType, ExecutionStatus, Id, IpVersion, ParamLocation, RuleAction, RuleKind};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Program {
    pub id: Id,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RootInput {
    pub id: Id,
    pub program_id: Id,
    pub value: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScopeRuleRow {
    pub id: Id,
    pub program_id: Id,
    pub kind: String,
    pub pattern: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

impl ScopeRuleRow {
    /// Projects the stored row onto the shared `recon_core::ScopeRule` the
    /// Scope Evaluator operates on. Rows with an unrecognized `kind`/`action`
    /// (which the CHECK constraints should make impossible) are dropped
    /// rather than panicking.
    pub fn to_domain(&self) -> Option<recon_core::ScopeRule> {
        let kind = match self.kind.as_str() {
            "domain" => RuleKind::Domain,
            "wildcard" => RuleKind::Wildcard,
            "regex" => RuleKind::Regex,
            "cidr" => RuleKind::Cidr,
            _ => return None,
        };
        let action = match self.action.as_str() {
            "include" => RuleAction::Include,
            "exclude" => RuleAction::Exclude,
            _ => return None,
        };
        Some(recon_core::ScopeRule {
            id: self.id,
            program_id: self.program_id,
            kind,
            pattern: self.pattern.clone(),
            action,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Host {
    pub id: Id,
    pub program_id: Id,
    pub hostname: String,
    pub in_scope: bool,
    pub cname_chain: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct IpAddressRow {
    pub id: Id,
    pub program_id: Id,
    pub address: String,
    pub version: String,
    pub in_scope: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HostIp {
    pub id: Id,
    pub host_id: Id,
    pub ip_id: Id,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Service {
    pub id: Id,
    pub ip_id: Id,
    pub scheme: String,
    pub port: i32,
    pub technologies: Json,
    pub favicon_hash: Option<String>,
    pub websocket: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Id,
    pub host_id: Id,
    pub service_id: Id,
    pub path: String,
    pub normalized_path: String,
    pub method: String,
    pub methods: Vec<String>,
    pub status_code: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct InputParameter {
    pub id: Id,
    pub endpoint_id: Id,
    pub name: String,
    pub location: String,
    pub param_type: String,
    pub reflected: bool,
    pub is_array: bool,
    pub example: Option<String>,
}

impl InputParameter {
    pub fn location_enum(&self) -> Option<ParamLocation> {
        match self.location.as_str() {
            "query" => Some(ParamLocation::Query),
            "body" => Some(ParamLocation::Body),
            "header" => Some(ParamLocation::Header),
            "cookie" => Some(ParamLocation::Cookie),
            "path" => Some(ParamLocation::Path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Header {
    pub id: Id,
    pub endpoint_id: Id,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RawBody {
    pub id: Id,
    pub endpoint_id: Id,
    pub content: String,
    pub sha256: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: Id,
    pub host_id: Id,
    pub record_type: String,
    pub value: String,
    pub ttl: Option<i32>,
    pub priority: Option<i32>,
    pub is_wildcard: bool,
}

impl DnsRecord {
    pub fn record_type_enum(&self) -> Option<DnsRecordType> {
        match self.record_type.as_str() {
            "A" => Some(DnsRecordType::A),
            "AAAA" => Some(DnsRecordType::Aaaa),
            "CNAME" => Some(DnsRecordType::Cname),
            "MX" => Some(DnsRecordType::Mx),
            "TXT" => Some(DnsRecordType::Txt),
            "NS" => Some(DnsRecordType::Ns),
            "SOA" => Some(DnsRecordType::Soa),
            "PTR" => Some(DnsRecordType::Ptr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScannerTemplate {
    pub id: Id,
    pub name: String,
    pub tool: String,
    pub config: Json,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScannerExecution {
    pub id: Id,
    pub program_id: Id,
    pub template_id: Option<Id>,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ScannerExecution {
    pub fn status_enum(&self) -> Option<ExecutionStatus> {
        match self.status.as_str() {
            "pending" => Some(ExecutionStatus::Pending),
            "running" => Some(ExecutionStatus::Running),
            "completed" => Some(ExecutionStatus::Completed),
            "failed" => Some(ExecutionStatus::Failed),
            "cancelled" => Some(ExecutionStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payload {
    pub id: Id,
    pub execution_id: Id,
    pub content: String,
    pub kind: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Finding {
    pub id: Id,
    pub endpoint_id: Option<Id>,
    pub execution_id: Option<Id>,
    pub severity: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Leak {
    pub id: Id,
    pub finding_id: Option<Id>,
    pub kind: String,
    pub value_redacted: String,
    pub source: String,
}

pub fn ip_version_str(v: IpVersion) -> &'static str {
    match v {
        IpVersion::V4 => "v4",
        IpVersion::V6 => "v6",
    }
}
