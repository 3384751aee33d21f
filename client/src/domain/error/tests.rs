//! Tests for failure classification and the flat error strings slices store.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(401, FailureKind::Authorization)]
#[case(403, FailureKind::Authorization)]
#[case(404, FailureKind::NotFound)]
#[case(422, FailureKind::Validation)]
#[case(500, FailureKind::Server)]
#[case(409, FailureKind::Server)]
fn from_status_classifies_by_code(#[case] status: u16, #[case] expected: FailureKind) {
    let failure = ApiFailure::from_status(status, ErrorBody::default());
    assert_eq!(failure.kind(), expected);
    assert_eq!(failure.status(), Some(status));
}

#[rstest]
fn validation_display_joins_field_messages() {
    let body = ErrorBody::from_json(&json!({
        "message": "The given data was invalid.",
        "errors": {
            "email": ["The email has already been taken."],
            "nombre": ["The name field is required.", "The name is too short."]
        }
    }));
    let failure = ApiFailure::from_status(422, body);
    assert_eq!(
        failure.to_string(),
        "Invalid data: The email has already been taken., The name field is required., The name is too short."
    );
}

#[rstest]
fn validation_without_fields_falls_back_to_message() {
    let failure = ApiFailure::from_status(422, ErrorBody::with_message("Bad payload"));
    assert_eq!(failure.to_string(), "Bad payload");
}

#[rstest]
fn forbidden_prefers_server_message() {
    let failure = ApiFailure::from_status(403, ErrorBody::with_message("Solo administradores"));
    assert_eq!(failure.to_string(), "Solo administradores");
}

#[rstest]
fn forbidden_without_message_uses_fallback() {
    let failure = ApiFailure::from_status(403, ErrorBody::default());
    assert_eq!(failure.to_string(), NOT_AUTHORIZED_MESSAGE);
}

#[rstest]
fn unknown_status_without_message_mentions_code() {
    let failure = ApiFailure::from_status(503, ErrorBody::default());
    assert_eq!(failure.to_string(), "Request failed with status 503.");
}

#[rstest]
fn transport_display_hides_detail() {
    let failure = ApiFailure::transport("dns error: no such host");
    assert_eq!(failure.to_string(), NO_CONNECTION_MESSAGE);
    assert_eq!(failure.status(), None);
}

#[rstest]
fn decode_display_is_fixed() {
    let failure = ApiFailure::decode("expected value at line 1");
    assert_eq!(failure.to_string(), UNPARSEABLE_MESSAGE);
}

#[rstest]
#[case(b"not json".as_slice())]
#[case(b"".as_slice())]
#[case(b"[1, 2]".as_slice())]
fn from_slice_tolerates_non_object_bodies(#[case] bytes: &[u8]) {
    assert_eq!(ErrorBody::from_slice(bytes), ErrorBody::default());
}

#[rstest]
fn from_json_accepts_single_string_field_errors() {
    let body = ErrorBody::from_json(&json!({"errors": {"titulo": "Required", "x": 5}}));
    assert_eq!(body.errors.len(), 1);
    assert_eq!(body.errors.get("titulo"), Some(&vec!["Required".to_owned()]));
}

#[rstest]
fn blank_message_counts_as_absent() {
    let body = ErrorBody::from_json(&json!({"message": "   "}));
    assert!(body.message.is_none());
}
