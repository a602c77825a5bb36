//! ML Metadata store message types (ml_metadata.MetadataStoreService).
//! Manually defined to match metadata_store.proto field numbers; proto
//! (`Any`) property values are not modelled.

use std::collections::BTreeMap;

/// A property value attached to an artifact, execution or context.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Value {
    #[prost(oneof = "value::Kind", tags = "1, 2, 3, 4, 6")]
    pub value: Option<value::Kind>,
}

pub mod value {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(int64, tag = "1")]
        IntValue(i64),
        #[prost(double, tag = "2")]
        DoubleValue(f64),
        #[prost(string, tag = "3")]
        StringValue(String),
        #[prost(message, tag = "4")]
        StructValue(prost_types::Struct),
        #[prost(bool, tag = "6")]
        BoolValue(bool),
    }
}

impl Value {
    pub fn int(v: i64) -> Self {
        Self { value: Some(value::Kind::IntValue(v)) }
    }

    pub fn double(v: f64) -> Self {
        Self { value: Some(value::Kind::DoubleValue(v)) }
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self { value: Some(value::Kind::StringValue(v.into())) }
    }

    pub fn bool(v: bool) -> Self {
        Self { value: Some(value::Kind::BoolValue(v)) }
    }

    pub fn structure(v: prost_types::Struct) -> Self {
        Self { value: Some(value::Kind::StructValue(v)) }
    }

    /// The struct payload, if this is a `struct_value`.
    pub fn as_struct(&self) -> Option<&prost_types::Struct> {
        match &self.value {
            Some(value::Kind::StructValue(s)) => Some(s),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ArtifactState {
    Unknown = 0,
    Pending = 1,
    Live = 2,
    MarkedForDeletion = 3,
    Deleted = 4,
    Abandoned = 5,
    Reference = 6,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Artifact {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub type_id: i64,
    #[prost(string, tag = "3")]
    pub uri: String,
    #[prost(btree_map = "string, message", tag = "4")]
    pub properties: BTreeMap<String, Value>,
    #[prost(btree_map = "string, message", tag = "5")]
    pub custom_properties: BTreeMap<String, Value>,
    #[prost(enumeration = "ArtifactState", tag = "6")]
    pub state: i32,
    #[prost(string, tag = "7")]
    pub name: String,
    #[prost(string, tag = "8")]
    pub r#type: String,
    #[prost(int64, tag = "9")]
    pub create_time_since_epoch: i64,
    #[prost(int64, tag = "10")]
    pub last_update_time_since_epoch: i64,
    #[prost(string, tag = "11")]
    pub external_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ExecutionState {
    Unknown = 0,
    New = 1,
    Running = 2,
    Complete = 3,
    Failed = 4,
    Cached = 5,
    Canceled = 6,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Execution {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub type_id: i64,
    #[prost(enumeration = "ExecutionState", tag = "3")]
    pub last_known_state: i32,
    #[prost(btree_map = "string, message", tag = "4")]
    pub properties: BTreeMap<String, Value>,
    #[prost(btree_map = "string, message", tag = "5")]
    pub custom_properties: BTreeMap<String, Value>,
    #[prost(string, tag = "6")]
    pub name: String,
    #[prost(string, tag = "7")]
    pub r#type: String,
    #[prost(int64, tag = "8")]
    pub create_time_since_epoch: i64,
    #[prost(int64, tag = "9")]
    pub last_update_time_since_epoch: i64,
    #[prost(string, tag = "10")]
    pub external_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Context {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(int64, tag = "2")]
    pub type_id: i64,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(btree_map = "string, message", tag = "4")]
    pub properties: BTreeMap<String, Value>,
    #[prost(btree_map = "string, message", tag = "5")]
    pub custom_properties: BTreeMap<String, Value>,
    #[prost(string, tag = "6")]
    pub r#type: String,
    #[prost(int64, tag = "7")]
    pub create_time_since_epoch: i64,
    #[prost(int64, tag = "8")]
    pub last_update_time_since_epoch: i64,
    #[prost(string, tag = "9")]
    pub external_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    Unknown = 0,
    DeclaredOutput = 1,
    DeclaredInput = 2,
    Input = 3,
    Output = 4,
    InternalInput = 5,
    InternalOutput = 6,
    PendingOutput = 7,
}

/// Links an artifact to the execution that read or produced it.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Event {
    #[prost(int64, tag = "1")]
    pub artifact_id: i64,
    #[prost(int64, tag = "2")]
    pub execution_id: i64,
    #[prost(enumeration = "EventType", tag = "4")]
    pub r#type: i32,
    #[prost(int64, tag = "5")]
    pub milliseconds_since_epoch: i64,
}

// ── Service responses ──

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetArtifactsResponse {
    #[prost(message, repeated, tag = "1")]
    pub artifacts: Vec<Artifact>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetArtifactsByIdResponse {
    #[prost(message, repeated, tag = "1")]
    pub artifacts: Vec<Artifact>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetArtifactsByContextResponse {
    #[prost(message, repeated, tag = "1")]
    pub artifacts: Vec<Artifact>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetExecutionsResponse {
    #[prost(message, repeated, tag = "1")]
    pub executions: Vec<Execution>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetExecutionsByIdResponse {
    #[prost(message, repeated, tag = "1")]
    pub executions: Vec<Execution>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetExecutionsByContextResponse {
    #[prost(message, repeated, tag = "1")]
    pub executions: Vec<Execution>,
    #[prost(string, tag = "2")]
    pub next_page_token: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetContextByTypeAndNameResponse {
    #[prost(message, optional, tag = "1")]
    pub context: Option<Context>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetEventsByExecutionIdsResponse {
    #[prost(message, repeated, tag = "1")]
    pub events: Vec<Event>,
}

/// Service method names as they appear in the request path.
pub const METHOD_GET_ARTIFACTS: &str = "GetArtifacts";
pub const METHOD_GET_ARTIFACTS_BY_ID: &str = "GetArtifactsByID";
pub const METHOD_GET_ARTIFACTS_BY_CONTEXT: &str = "GetArtifactsByContext";
pub const METHOD_GET_ARTIFACT_TYPES: &str = "GetArtifactTypes";
pub const METHOD_GET_EXECUTIONS: &str = "GetExecutions";
pub const METHOD_GET_EXECUTIONS_BY_ID: &str = "GetExecutionsByID";
pub const METHOD_GET_EXECUTIONS_BY_CONTEXT: &str = "GetExecutionsByContext";
pub const METHOD_GET_CONTEXT_BY_TYPE_AND_NAME: &str = "GetContextByTypeAndName";
pub const METHOD_GET_EVENTS_BY_EXECUTION_IDS: &str = "GetEventsByExecutionIDs";

pub const SERVICE_NAME: &str = "ml_metadata.MetadataStoreService";
