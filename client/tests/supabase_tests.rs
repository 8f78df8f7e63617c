mod common;

use common::can_bind_localhost;
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use std::time::Duration;

use chrono::NaiveDate;
use matsya_client::backend::{BackendError, ManagedBackend, Session, SupabaseBackend};
use matsya_common::model::analysis::{AnalysisRequest, NewAnalysis};
use matsya_common::model::edna::{EdnaMetadata, EdnaStatus, NewEdnaSample, SequenceStats};
use matsya_common::requests::SpeciesQuery;

const ANON: &str = "anon-key";

fn backend(server: &MockServer) -> SupabaseBackend {
    SupabaseBackend::new(&server.base_url(), ANON, "edna-files", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn species_search_uses_anon_key_until_signed_in() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let anon = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/species")
            .query_param("or", "(scientific_name.ilike.\"*hilsa*\",common_name.ilike.\"*hilsa*\")")
            .query_param("limit", "5")
            .header("apikey", ANON)
            .header("authorization", format!("Bearer {ANON}"));
        then.status(200).json_body(json!([
            {"id": 1, "scientific_name": "Tenualosa ilisha", "common_name": "Hilsa"}
        ]));
    });
    let signed_in = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/species")
            .header("authorization", "Bearer user-jwt");
        then.status(200).json_body(json!([]));
    });

    let backend = backend(&server);
    let query = SpeciesQuery {
        search: Some("hilsa".into()),
        limit: Some(5),
        offset: None,
    };
    let rows = backend.select_species(&query).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].common_name.as_deref(), Some("Hilsa"));
    anon.assert_hits(1);

    let mut changes = backend.auth_changes();
    backend.set_session(Some(Session {
        access_token: "user-jwt".into(),
        refresh_token: None,
        expires_at: None,
        user_id: None,
    }));
    assert!(changes.has_changed().unwrap());
    assert_eq!(
        backend.current_session().await.unwrap().unwrap().access_token,
        "user-jwt"
    );
    assert!(backend.select_species(&SpeciesQuery::default()).await.unwrap().is_empty());
    signed_in.assert_hits(1);
}

#[tokio::test]
async fn blob_path_comes_from_the_storage_response() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method(POST)
            .path("/storage/v1/object/edna-files/S-1/17_reads.fasta")
            .header("content-type", "text/x-fasta")
            .body(">a\nACGT\n");
        then.status(200)
            .json_body(json!({"Key": "edna-files/S-1/17_reads (1).fasta"}));
    });

    let backend = backend(&server);
    let blob = backend
        .upload_blob("S-1/17_reads.fasta", b">a\nACGT\n".to_vec(), "text/x-fasta")
        .await
        .unwrap();
    upload.assert_hits(1);
    assert_eq!(blob.path, "S-1/17_reads (1).fasta");
    assert_eq!(
        blob.public_url.as_deref(),
        Some(
            format!(
                "{}/storage/v1/object/public/edna-files/S-1/17_reads%20(1).fasta",
                server.base_url()
            )
            .as_str()
        )
    );
}

#[tokio::test]
async fn storage_response_without_key_is_an_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path_contains("/storage/v1/object/");
        then.status(200).json_body(json!({}));
    });

    let err = backend(&server)
        .upload_blob("S-1/1_a.fasta", b">a\nA\n".to_vec(), "text/plain")
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Storage(_)));
}

#[tokio::test]
async fn inserts_return_the_stored_row() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let insert_sample = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/edna_samples")
            .header("prefer", "return=representation")
            .json_body_partial(r#"{"sample_id": "S-1", "file_path": "S-1/1_a.fasta", "status": "uploaded"}"#);
        then.status(201).json_body(json!([{
            "id": "7c1e",
            "sample_id": "S-1",
            "location_name": "Chittagong",
            "latitude": 22.3,
            "longitude": 91.8,
            "collection_date": "2024-02-02",
            "status": "uploaded",
            "file_path": "S-1/1_a.fasta",
            "sequence_count": 1,
            "avg_sequence_length": 4.0,
            "file_format": "fasta"
        }]));
    });
    let insert_analysis = server.mock(|when, then| {
        when.method(POST).path("/rest/v1/analyses");
        then.status(201).json_body(json!([]));
    });

    let backend = backend(&server);
    let row = NewEdnaSample {
        metadata: EdnaMetadata {
            sample_id: "S-1".into(),
            location_name: "Chittagong".into(),
            latitude: 22.3,
            longitude: 91.8,
            collection_date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            depth: None,
        },
        status: EdnaStatus::Uploaded,
        file_path: "S-1/1_a.fasta".into(),
        file_url: None,
        file_size: 8,
        file_md5: "0cc175b9c0f1b6a831c399e269772661".into(),
        stats: SequenceStats {
            sequence_count: 1,
            avg_sequence_length: 4.0,
            ..SequenceStats::default()
        },
    };
    let sample = backend.insert_edna_sample(&row).await.unwrap();
    assert_eq!(sample.file_path.as_deref(), Some("S-1/1_a.fasta"));
    insert_sample.assert_hits(1);

    let analysis = NewAnalysis::from(AnalysisRequest {
        name: "Shannon".into(),
        analysis_type: "diversity".into(),
        parameters: json!({}),
    });
    let err = backend.insert_analysis(&analysis).await.unwrap_err();
    assert!(matches!(err, BackendError::EmptyInsert("analyses")));
    insert_analysis.assert_hits(1);
}

#[tokio::test]
async fn http_failures_carry_status_and_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rest/v1/analyses");
        then.status(401).body(r#"{"message":"JWT expired"}"#);
    });

    match backend(&server).select_analyses().await {
        Err(BackendError::Http { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("JWT expired"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
