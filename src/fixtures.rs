use std::collections::BTreeMap;

use prost::Message;
use prost_types::value::Kind as StructKind;
use prost_types::{ListValue, Struct};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::encode_ok;
use crate::mlmd::*;

const CREATED_AT: i64 = 1611399342384;

/// Canned payloads selectable from config and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Fixture {
    Artifacts,
    Executions,
    Context,
    Events,
    Empty,
}

impl Fixture {
    /// Serialized protobuf body for this fixture.
    pub fn payload(self) -> Vec<u8> {
        match self {
            Self::Artifacts => mocked_artifacts_response().encode_to_vec(),
            Self::Executions => mocked_executions_response().encode_to_vec(),
            Self::Context => mocked_context_response().encode_to_vec(),
            Self::Events => mocked_events_response().encode_to_vec(),
            Self::Empty => Vec::new(),
        }
    }

    /// Fixture served for a method when config does not override it.
    pub fn default_for(method: &str) -> Option<Self> {
        let fixture = match method {
            METHOD_GET_ARTIFACTS | METHOD_GET_ARTIFACTS_BY_CONTEXT => Self::Artifacts,
            METHOD_GET_EXECUTIONS | METHOD_GET_EXECUTIONS_BY_CONTEXT => Self::Executions,
            METHOD_GET_CONTEXT_BY_TYPE_AND_NAME => Self::Context,
            METHOD_GET_EVENTS_BY_EXECUTION_IDS => Self::Events,
            METHOD_GET_ARTIFACTS_BY_ID | METHOD_GET_EXECUTIONS_BY_ID | METHOD_GET_ARTIFACT_TYPES => {
                Self::Empty
            }
            _ => return None,
        };
        Some(fixture)
    }
}

/// Every method the server answers out of the box.
pub const DEFAULT_METHODS: [&str; 9] = [
    METHOD_GET_ARTIFACTS,
    METHOD_GET_ARTIFACTS_BY_ID,
    METHOD_GET_ARTIFACTS_BY_CONTEXT,
    METHOD_GET_ARTIFACT_TYPES,
    METHOD_GET_EXECUTIONS,
    METHOD_GET_EXECUTIONS_BY_ID,
    METHOD_GET_EXECUTIONS_BY_CONTEXT,
    METHOD_GET_CONTEXT_BY_TYPE_AND_NAME,
    METHOD_GET_EVENTS_BY_EXECUTION_IDS,
];

// ── Envelope builders ──

pub fn mock_get_artifacts_response(response: &GetArtifactsResponse) -> Result<Vec<u8>> {
    encode_ok(&response.encode_to_vec())
}

pub fn mock_get_artifacts_by_id(response: &GetArtifactsByIdResponse) -> Result<Vec<u8>> {
    encode_ok(&response.encode_to_vec())
}

pub fn mock_get_artifacts_by_context(response: &GetArtifactsByContextResponse) -> Result<Vec<u8>> {
    encode_ok(&response.encode_to_vec())
}

pub fn mock_get_executions_response(response: &GetExecutionsResponse) -> Result<Vec<u8>> {
    encode_ok(&response.encode_to_vec())
}

pub fn mock_get_executions_by_id(response: &GetExecutionsByIdResponse) -> Result<Vec<u8>> {
    encode_ok(&response.encode_to_vec())
}

pub fn mock_get_executions_by_context(
    response: &GetExecutionsByContextResponse,
) -> Result<Vec<u8>> {
    encode_ok(&response.encode_to_vec())
}

pub fn mock_get_context_by_type_and_name(
    response: &GetContextByTypeAndNameResponse,
) -> Result<Vec<u8>> {
    encode_ok(&response.encode_to_vec())
}

pub fn mock_get_events_by_execution_ids(
    response: &GetEventsByExecutionIdsResponse,
) -> Result<Vec<u8>> {
    encode_ok(&response.encode_to_vec())
}

// ── Canned data ──

fn props(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn artifact(
    id: i64,
    type_id: i64,
    kind: &str,
    uri: &str,
    custom: &[(&str, Value)],
) -> Artifact {
    Artifact {
        id,
        type_id,
        r#type: kind.to_string(),
        uri: uri.to_string(),
        custom_properties: props(custom),
        state: ArtifactState::Live as i32,
        create_time_since_epoch: CREATED_AT,
        last_update_time_since_epoch: CREATED_AT,
        ..Default::default()
    }
}

// google.protobuf.Struct helpers for struct-valued properties.

fn number(n: f64) -> prost_types::Value {
    prost_types::Value {
        kind: Some(StructKind::NumberValue(n)),
    }
}

fn text(s: &str) -> prost_types::Value {
    prost_types::Value {
        kind: Some(StructKind::StringValue(s.to_string())),
    }
}

fn list(values: Vec<prost_types::Value>) -> prost_types::Value {
    prost_types::Value {
        kind: Some(StructKind::ListValue(ListValue { values })),
    }
}

fn object(fields: Vec<(&str, prost_types::Value)>) -> Struct {
    Struct {
        fields: fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    }
}

fn nested(fields: Vec<(&str, prost_types::Value)>) -> prost_types::Value {
    prost_types::Value {
        kind: Some(StructKind::StructValue(object(fields))),
    }
}

/// ROC points as (confidenceThreshold, falsePositiveRate, recall).
const CONFIDENCE_POINTS: [(f64, f64, f64); 4] = [
    (2.0, 0.0, 0.0),
    (1.0, 0.0, 0.33962264150943394),
    (0.9, 0.0, 0.6037735849056604),
    (0.8, 0.0, 0.8490566037735849),
];

fn confidence_metrics() -> Value {
    let points = CONFIDENCE_POINTS
        .iter()
        .map(|&(threshold, fpr, recall)| {
            nested(vec![
                ("confidenceThreshold", number(threshold)),
                ("falsePositiveRate", number(fpr)),
                ("recall", number(recall)),
            ])
        })
        .collect();
    Value::structure(object(vec![("list", list(points))]))
}

fn confusion_matrix() -> Value {
    let spec = |name: &str| nested(vec![("displayName", text(name))]);
    let row = |cells: [f64; 3]| nested(vec![("row", list(cells.into_iter().map(number).collect()))]);
    Value::structure(object(vec![(
        "struct",
        nested(vec![
            ("annotationSpecs", list(vec![spec("Setosa"), spec("Versicolour")])),
            ("rows", list(vec![row([37.0, 0.0, 0.0]), row([15.0, 7.0, 11.0])])),
        ]),
    )]))
}

pub fn mocked_artifacts_response() -> GetArtifactsResponse {
    let scalar_uri = "s3://scalar-metrics-uri-scalar-metrics-uri";
    GetArtifactsResponse {
        artifacts: vec![
            artifact(
                1,
                14,
                "system.Metrics",
                scalar_uri,
                &[
                    ("accuracy", Value::double(92.0)),
                    ("display_name", Value::string("scalar metrics")),
                ],
            ),
            artifact(
                2,
                16,
                "system.Dataset",
                "s3://dataset-uri",
                &[("display_name", Value::string("dataset"))],
            ),
            artifact(
                3,
                15,
                "system.ClassificationMetrics",
                "s3://confidence-metrics-uri",
                &[
                    ("confidenceMetrics", confidence_metrics()),
                    ("display_name", Value::string("confidence metrics")),
                ],
            ),
            artifact(
                4,
                15,
                "system.ClassificationMetrics",
                "s3://confusion-matrix-uri",
                &[
                    ("confusionMatrix", confusion_matrix()),
                    ("display_name", Value::string("confusion matrix")),
                ],
            ),
            artifact(
                6,
                18,
                "system.HTML",
                "s3://html-metrics-uri",
                &[("display_name", Value::string("html metrics"))],
            ),
            artifact(7, 14, "system.Metrics", scalar_uri, &[]),
            artifact(
                8,
                15,
                "system.ClassificationMetrics",
                scalar_uri,
                &[
                    ("display_name", Value::string("registered model metrics")),
                    ("registeredModelName", Value::string("model")),
                    ("registeredModelId", Value::string("1")),
                    ("modelVersionName", Value::string("1")),
                    ("modelVersionId", Value::string("1")),
                    ("modelRegistryName", Value::string("model-registry")),
                ],
            ),
        ],
        next_page_token: String::new(),
    }
}

fn execution(id: i64, task: &str, state: ExecutionState) -> Execution {
    Execution {
        id,
        type_id: 13,
        r#type: "system.ContainerExecution".to_string(),
        last_known_state: state as i32,
        custom_properties: props(&[
            ("task_name", Value::string(task)),
            ("parent_dag_id", Value::int(210)),
        ]),
        create_time_since_epoch: CREATED_AT,
        last_update_time_since_epoch: CREATED_AT,
        ..Default::default()
    }
}

pub fn mocked_executions_response() -> GetExecutionsResponse {
    GetExecutionsResponse {
        executions: vec![
            execution(211, "metrics-visualization", ExecutionState::Complete),
            execution(212, "markdown-visualization", ExecutionState::Complete),
            execution(213, "html-visualization", ExecutionState::Cached),
        ],
        next_page_token: String::new(),
    }
}

pub fn mocked_context_response() -> GetContextByTypeAndNameResponse {
    GetContextByTypeAndNameResponse {
        context: Some(Context {
            id: 1,
            type_id: 11,
            name: "test-run".to_string(),
            r#type: "system.PipelineRun".to_string(),
            custom_properties: props(&[
                ("namespace", Value::string("test-project-name")),
                ("resource_name", Value::string("test-run")),
                ("store_session_info", Value::bool(true)),
            ]),
            create_time_since_epoch: CREATED_AT,
            last_update_time_since_epoch: CREATED_AT,
            ..Default::default()
        }),
    }
}

pub fn mocked_events_response() -> GetEventsByExecutionIdsResponse {
    let event = |artifact_id, execution_id, kind: EventType| Event {
        artifact_id,
        execution_id,
        r#type: kind as i32,
        milliseconds_since_epoch: CREATED_AT,
    };
    GetEventsByExecutionIdsResponse {
        events: vec![
            event(2, 211, EventType::Input),
            event(1, 211, EventType::Output),
            event(6, 213, EventType::Output),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decode_envelope;

    #[test]
    fn test_artifacts_envelope_decodes() {
        let response = mocked_artifacts_response();
        let body = mock_get_artifacts_response(&response).unwrap();

        let env = decode_envelope(&body).unwrap();
        assert_eq!(env.status, 0);
        assert_eq!(env.message, "");

        let decoded = GetArtifactsResponse::decode(env.payload.as_slice()).unwrap();
        assert_eq!(decoded, response);
        assert_eq!(decoded.artifacts[0].state(), ArtifactState::Live);
        assert_eq!(
            decoded.artifacts[0].custom_properties["accuracy"],
            Value::double(92.0)
        );

        let confidence = decoded.artifacts[2].custom_properties["confidenceMetrics"]
            .as_struct()
            .unwrap();
        let Some(StructKind::ListValue(points)) = &confidence.fields["list"].kind else {
            panic!("confidenceMetrics.list is not a list");
        };
        assert_eq!(points.values.len(), 4);
        let Some(StructKind::StructValue(last)) = &points.values[3].kind else {
            panic!("confidence point is not a struct");
        };
        assert_eq!(last.fields["confidenceThreshold"], number(0.8));
        assert_eq!(last.fields["recall"], number(0.8490566037735849));

        let matrix = decoded.artifacts[3].custom_properties["confusionMatrix"]
            .as_struct()
            .unwrap();
        let Some(StructKind::StructValue(inner)) = &matrix.fields["struct"].kind else {
            panic!("confusionMatrix.struct is not a struct");
        };
        let Some(StructKind::ListValue(specs)) = &inner.fields["annotationSpecs"].kind else {
            panic!("annotationSpecs is not a list");
        };
        assert_eq!(
            specs.values,
            vec![
                nested(vec![("displayName", text("Setosa"))]),
                nested(vec![("displayName", text("Versicolour"))]),
            ]
        );
        let Some(StructKind::ListValue(rows)) = &inner.fields["rows"].kind else {
            panic!("rows is not a list");
        };
        assert_eq!(
            rows.values[1],
            nested(vec![("row", list(vec![number(15.0), number(7.0), number(11.0)]))])
        );
    }

    #[test]
    fn test_empty_artifact_list() {
        let body = mock_get_artifacts_response(&GetArtifactsResponse::default()).unwrap();
        // An empty message encodes to zero bytes.
        assert_eq!(&body[..5], &[0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_by_id_selects_single_artifact() {
        let registered = mocked_artifacts_response().artifacts[6].clone();
        let response = GetArtifactsByIdResponse {
            artifacts: vec![registered.clone()],
        };
        let env = decode_envelope(&mock_get_artifacts_by_id(&response).unwrap()).unwrap();
        let decoded = GetArtifactsByIdResponse::decode(env.payload.as_slice()).unwrap();

        assert_eq!(decoded.artifacts, vec![registered]);
        assert_eq!(decoded.artifacts[0].id, 8);
    }

    #[test]
    fn test_other_builders_decode() {
        let executions = mocked_executions_response();
        let env = decode_envelope(&mock_get_executions_response(&executions).unwrap()).unwrap();
        assert_eq!(GetExecutionsResponse::decode(env.payload.as_slice()).unwrap(), executions);

        let by_ctx = GetExecutionsByContextResponse {
            executions: executions.executions.clone(),
            next_page_token: "next".to_string(),
        };
        let env = decode_envelope(&mock_get_executions_by_context(&by_ctx).unwrap()).unwrap();
        assert_eq!(
            GetExecutionsByContextResponse::decode(env.payload.as_slice()).unwrap(),
            by_ctx
        );

        let by_id = GetExecutionsByIdResponse {
            executions: vec![executions.executions[0].clone()],
        };
        let env = decode_envelope(&mock_get_executions_by_id(&by_id).unwrap()).unwrap();
        assert_eq!(GetExecutionsByIdResponse::decode(env.payload.as_slice()).unwrap(), by_id);

        let artifacts_by_ctx = GetArtifactsByContextResponse {
            artifacts: mocked_artifacts_response().artifacts,
            next_page_token: String::new(),
        };
        let env =
            decode_envelope(&mock_get_artifacts_by_context(&artifacts_by_ctx).unwrap()).unwrap();
        assert_eq!(
            GetArtifactsByContextResponse::decode(env.payload.as_slice()).unwrap(),
            artifacts_by_ctx
        );

        let context = mocked_context_response();
        let env = decode_envelope(&mock_get_context_by_type_and_name(&context).unwrap()).unwrap();
        let decoded = GetContextByTypeAndNameResponse::decode(env.payload.as_slice()).unwrap();
        assert_eq!(decoded.context.map(|c| c.name), Some("test-run".to_string()));

        let events = mocked_events_response();
        let env = decode_envelope(&mock_get_events_by_execution_ids(&events).unwrap()).unwrap();
        let decoded = GetEventsByExecutionIdsResponse::decode(env.payload.as_slice()).unwrap();
        assert_eq!(decoded.events[1].r#type(), EventType::Output);
    }

    #[test]
    fn test_fixture_payload_is_deterministic() {
        assert_eq!(Fixture::Artifacts.payload(), Fixture::Artifacts.payload());
        assert!(Fixture::Empty.payload().is_empty());
    }

    #[test]
    fn test_every_default_method_has_fixture() {
        for method in DEFAULT_METHODS {
            assert!(Fixture::default_for(method).is_some(), "{method}");
        }
        assert_eq!(Fixture::default_for("PutArtifacts"), None);
    }

    #[test]
    fn test_fixture_serde_names() {
        let f: Fixture = serde_json::from_str("\"executions\"").unwrap();
        assert_eq!(f, Fixture::Executions);
        assert_eq!(serde_json::to_string(&Fixture::Empty).unwrap(), "\"empty\"");
    }
}
