//! Behavioural tests for upload validation, batching and downloads.

use std::sync::Arc;

use client::domain::ports::{Blob, BlobFetchError, DownloadSinkError, HttpMethod, RequestBody};
use client::domain::{
    ApiFailure, AttachmentList, FileId, FileParent, FileTransferService, LifecycleStatus,
    MAX_UPLOAD_BYTES, ProjectId, SelectedFile, TaskId, TransferError, TransferFailureClass,
    UploadViolation, validate_selection,
};
use client::test_support::{RecordingSink, ScriptedGateway, file_json};
use rstest::{fixture, rstest};
use serde_json::json;

struct Harness {
    gateway: Arc<ScriptedGateway>,
    sink: Arc<RecordingSink>,
    service: FileTransferService<ScriptedGateway, RecordingSink>,
}

#[fixture]
fn harness() -> Harness {
    let gateway = Arc::new(ScriptedGateway::new());
    let sink = Arc::new(RecordingSink::new());
    let service = FileTransferService::new(Arc::clone(&gateway), Arc::clone(&sink));
    Harness {
        gateway,
        sink,
        service,
    }
}

fn sized(name: &str, mime: &str, size: usize) -> SelectedFile {
    SelectedFile::new(name, mime, vec![0_u8; size])
}

const PROJECT: FileParent = FileParent::Project(ProjectId::new(4));

#[rstest]
fn pdf_is_accepted_and_exe_rejected() {
    let pdf = sized("brief.pdf", "application/pdf", 1024);
    let exe = sized("setup.exe", "application/x-msdownload", 1024);

    let report = validate_selection(vec![pdf.clone(), exe.clone()]);

    assert_eq!(report.accepted, vec![pdf]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].file, exe);
    assert!(matches!(
        report.rejected[0].violation,
        UploadViolation::DisallowedType { .. }
    ));
}

#[rstest]
#[case(MAX_UPLOAD_BYTES, true)]
#[case(MAX_UPLOAD_BYTES + 1, false)]
fn size_ceiling_is_inclusive(#[case] size: u64, #[case] accepted: bool) {
    let size = usize::try_from(size).expect("fits in memory");
    let report = validate_selection(vec![sized("scan.jpg", "image/jpeg", size)]);
    assert_eq!(report.rejected.is_empty(), accepted);
    assert_eq!(report.accepted.len(), usize::from(accepted));
}

#[rstest]
#[tokio::test]
async fn rejected_selection_sends_nothing(harness: Harness) {
    let error = harness
        .service
        .upload_selection(
            PROJECT,
            vec![
                sized("brief.pdf", "application/pdf", 10),
                sized("setup.exe", "application/x-msdownload", 10),
            ],
        )
        .await
        .expect_err("blocked");

    assert_eq!(error.class(), TransferFailureClass::Validation);
    assert_eq!(
        error.to_string(),
        "File type not allowed: setup.exe (application/x-msdownload). Allowed: PDF, DOC/DOCX, JPG."
    );
    assert!(harness.gateway.requests().is_empty());
}

#[rstest]
#[tokio::test]
async fn accepted_files_go_out_as_one_batch(harness: Harness) {
    harness.gateway.reply_data(
        HttpMethod::Post,
        "projects/4/files",
        json!([
            file_json(1, 4, "brief.pdf", "application/pdf"),
            file_json(2, 4, "scan.jpg", "image/jpeg"),
        ]),
    );

    let created = harness
        .service
        .upload_selection(
            PROJECT,
            vec![
                sized("brief.pdf", "application/pdf", 10),
                sized("scan.jpg", "image/jpeg", 20),
            ],
        )
        .await
        .expect("upload");

    assert_eq!(created.len(), 2);
    let requests = harness.gateway.requests();
    assert_eq!(requests.len(), 1);
    let RequestBody::Multipart { field, files } = &requests[0].body else {
        panic!("expected multipart body");
    };
    assert_eq!(*field, "archivos[]");
    assert_eq!(files.len(), 2);
    assert!(!harness.service.progress().is_uploading(PROJECT));
}

#[rstest]
#[tokio::test]
async fn json_error_blob_surfaces_server_message(harness: Harness) {
    harness.gateway.blob(
        "tasks/3/files/9/download",
        Err(BlobFetchError::rejected(
            404_u16,
            Blob::new(
                Some("application/json".to_owned()),
                br#"{"message":"File missing"}"#.to_vec(),
            ),
        )),
    );

    let error = harness
        .service
        .download_file(FileParent::Task(TaskId::new(3)), FileId::new(9), "x.pdf")
        .await
        .expect_err("missing");

    assert_eq!(error.to_string(), "File missing");
    assert!(harness.sink.saved().is_empty());
}

#[rstest]
#[tokio::test]
async fn successful_blob_is_saved_even_when_it_is_json(harness: Harness) {
    let payload = br#"{"message":"this is the file"}"#.to_vec();
    harness.gateway.blob(
        "projects/4/files/5/download",
        Ok(Blob::new(Some("application/json".to_owned()), payload.clone())),
    );

    let saved = harness
        .service
        .download_file(PROJECT, FileId::new(5), "data.json")
        .await
        .expect("saved");

    assert_eq!(saved.name, "data.json");
    assert_eq!(harness.sink.saved(), vec![("data.json".to_owned(), payload)]);
}

#[rstest]
#[tokio::test]
async fn sink_failure_is_a_storage_error() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.blob(
        "projects/4/files/5/download",
        Ok(Blob::new(Some("application/pdf".to_owned()), b"%PDF".to_vec())),
    );
    let sink = Arc::new(RecordingSink::failing(DownloadSinkError::write("disk full")));
    let service = FileTransferService::new(gateway, sink);

    let error = service
        .download_file(PROJECT, FileId::new(5), "a.pdf")
        .await
        .expect_err("disk full");

    assert_eq!(error.class(), TransferFailureClass::Storage);
    assert!(matches!(error, TransferError::Save(_)));
}

#[rstest]
#[tokio::test]
async fn attachment_list_refreshes_and_removes(harness: Harness) {
    harness.gateway.reply_data(
        HttpMethod::Get,
        "projects/4/files",
        json!([
            file_json(1, 4, "brief.pdf", "application/pdf"),
            file_json(2, 4, "legacy.png", "image/png"),
        ]),
    );
    harness
        .gateway
        .reply(HttpMethod::Delete, "projects/4/files/1", Ok(serde_json::Value::Null));
    let mut list = AttachmentList::new(PROJECT);

    list.refresh(&harness.service).await.expect("refresh");
    assert_eq!(list.files().len(), 2);
    assert_eq!(list.visible().count(), 1);

    list.remove(&harness.service, FileId::new(1))
        .await
        .expect("remove");
    assert_eq!(list.files().len(), 1);
    assert_eq!(list.files()[0].id, FileId::new(2));
}

#[rstest]
#[tokio::test]
async fn upload_stands_when_the_reload_fails(harness: Harness) {
    harness.gateway.reply_data(
        HttpMethod::Post,
        "projects/4/files",
        json!([file_json(7, 4, "brief.pdf", "application/pdf")]),
    );
    harness.gateway.reply(
        HttpMethod::Get,
        "projects/4/files",
        Err(ApiFailure::transport("connection reset")),
    );
    let mut list = AttachmentList::new(PROJECT);

    let created = list
        .upload(&harness.service, vec![sized("brief.pdf", "application/pdf", 10)])
        .await
        .expect("server stored the batch");

    assert_eq!(created.len(), 1);
    assert!(harness.gateway.was_called(HttpMethod::Post, "projects/4/files"));
    assert_eq!(list.files(), created.as_slice());
    assert_eq!(list.status(), LifecycleStatus::Failed);
    assert_eq!(
        list.error(),
        Some("Unable to reach the server. Check your connection.")
    );
}
