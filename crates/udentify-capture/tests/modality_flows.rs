#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! End-to-end flows of the individual modality modules against scripted
//! vendors.

mod common;

use std::collections::BTreeMap;

use common::{face_creds, map, sample_mrz, Harness, IMAGE, SERVER};
use serde_json::json;
use udentify_core::liveness::{
    FaceIdMessage, FaceIdResult, FaceMethod, LivenessEvent, LivenessPayload, LivenessRequest,
};
use udentify_core::nfc::{ChipAuthentication, NfcEvent, NfcPayload, NfcRequest, PassportData};
use udentify_core::ocr::{
    DocumentImages, DocumentSide, DocumentType, OcrEvent, OcrFields, OcrPayload, OcrRequest,
};
use udentify_core::video_call::{
    CallEnd, CallStatus, ParticipantType, VideoCallEvent, VideoCallPayload,
};
use udentify_core::{
    Capability, ErrorKind, EventPayload, ImageData, Modality, PermissionState, ProgressEvent,
};

// ── OCR ────────────────────────────────────────────────────────────────────

fn scanned() -> OcrPayload {
    OcrPayload::Scanned(DocumentImages {
        front: Some(ImageData::from_bytes(b"front")),
        back: Some(ImageData::from_bytes(b"back")),
    })
}

#[tokio::test]
async fn scan_then_ocr_reuses_stored_images() {
    let h = Harness::new();
    let bridge = h.bridge.clone();
    let scan = tokio::spawn(async move {
        bridge
            .ocr
            .start_ocr_scanning(SERVER, "tx-ocr", "id_card", "both")
            .await
    });
    let sink = h.ocr.next_sink().await;
    let OcrRequest::Scan { side, document_type, .. } = h.ocr.last_request() else {
        panic!("expected a scan request");
    };
    assert_eq!(side, DocumentSide::Both);
    assert_eq!(document_type, DocumentType::IdCard);
    sink.progress(OcrEvent::DocumentScanned { side: DocumentSide::Front });
    sink.succeed(scanned());
    assert!(scan.await.unwrap().unwrap().success);

    let bridge = h.bridge.clone();
    let ocr = tokio::spawn(async move {
        bridge
            .ocr
            .perform_ocr(SERVER, "tx-ocr", "", None, None)
            .await
    });
    let sink = h.ocr.next_sink().await;
    let OcrRequest::Recognize {
        document_type,
        images,
        ..
    } = h.ocr.last_request()
    else {
        panic!("expected a recognize request");
    };
    assert_eq!(document_type, DocumentType::IdCard);
    assert_eq!(images.front, Some(ImageData::from_bytes(b"front")));

    let fields = OcrFields {
        document_type: DocumentType::IdCard,
        fields: BTreeMap::from([("firstName".to_owned(), json!("JANE"))]),
    };
    sink.succeed(OcrPayload::Recognized(fields));
    let result = ocr.await.unwrap().unwrap();
    let Some(OcrPayload::Recognized(fields)) = result.payload else {
        panic!("expected recognized fields");
    };
    assert_eq!(fields.text("firstName"), Some("JANE"));
}

#[tokio::test]
async fn stored_scan_is_not_shared_across_transactions() {
    let h = Harness::new();
    let bridge = h.bridge.clone();
    let scan = tokio::spawn(async move {
        bridge
            .ocr
            .start_ocr_scanning(SERVER, "tx-a", "passport", "front")
            .await
    });
    h.ocr.next_sink().await.succeed(scanned());
    scan.await.unwrap().unwrap();

    let err = h
        .bridge
        .ocr
        .perform_document_liveness(SERVER, "tx-b", None, Some("  "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    assert_eq!(h.ocr.launches(), 1);
}

#[tokio::test]
async fn ocr_rejects_unknown_document_type_and_bad_videos() {
    let h = Harness::new();
    let err = h
        .bridge
        .ocr
        .start_ocr_scanning(SERVER, "tx", "visa", "front")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);

    let err = h
        .bridge
        .ocr
        .perform_hologram_check(SERVER, "tx", &["not a url".to_owned()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    assert_eq!(h.ocr.launches(), 0);
}

#[tokio::test]
async fn server_side_ocr_needs_no_camera() {
    let h = Harness::new();
    h.gate.set(Capability::Camera, PermissionState::Denied);

    let bridge = h.bridge.clone();
    let pending = tokio::spawn(async move {
        bridge
            .ocr
            .perform_hologram_check(SERVER, "tx-h", &["file:///tmp/clip.mp4".to_owned()])
            .await
    });
    let sink = h.ocr.next_sink().await;
    sink.succeed(OcrPayload::HologramVideos {
        video_urls: vec!["file:///tmp/clip.mp4".into()],
    });
    assert!(pending.await.unwrap().unwrap().success);
}

// ── Liveness ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn face_registration_round_trip() {
    let h = Harness::new();
    let mut events = h.bridge.subscribe(Some(Modality::Liveness));
    let bridge = h.bridge.clone();
    let pending = tokio::spawn(async move {
        bridge
            .liveness
            .start_face_recognition_registration(&face_creds("tx-face"))
            .await
    });
    let sink = h.liveness.next_sink().await;
    assert!(matches!(
        h.liveness.last_request(),
        LivenessRequest::FaceCamera {
            method: FaceMethod::Registration,
            ..
        }
    ));
    assert!(h.bridge.liveness.is_face_recognition_in_progress());

    sink.progress(LivenessEvent::PhotoTaken);
    sink.succeed(LivenessPayload::Recognition(FaceIdMessage {
        face_id: Some(FaceIdResult {
            verified: true,
            match_score: 0.97,
            description: "ok".into(),
            transaction_id: Some("tx-face".into()),
            user_id: Some("user-1".into()),
            method: Some(FaceMethod::Registration),
            list_names: None,
            registration_transaction_id: None,
        }),
        ..FaceIdMessage::default()
    }));

    let result = pending.await.unwrap().unwrap();
    assert!(result.success);
    assert_eq!(
        events.try_recv().unwrap().payload,
        EventPayload::from(LivenessEvent::PhotoTaken)
    );
    assert!(!h.bridge.liveness.is_face_recognition_in_progress());
}

#[tokio::test]
async fn liveness_credentials_are_validated_first() {
    let h = Harness::new();
    let creds = map(json!({ "serverURL": SERVER, "transactionID": "tx" }));
    let err = h
        .bridge
        .liveness
        .start_selfie_capture(&creds)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);

    let err = h
        .bridge
        .liveness
        .delete_user_from_list(SERVER, "tx", "", IMAGE)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    assert_eq!(h.liveness.launches(), 0);
}

#[tokio::test]
async fn denied_camera_blocks_liveness_authentication() {
    let h = Harness::new();
    h.gate.set(Capability::Camera, PermissionState::Denied);
    let report = h.bridge.check_permissions(Modality::Liveness).await.unwrap();
    assert_eq!(report.overall(), PermissionState::Denied);

    let err = h
        .bridge
        .liveness
        .start_face_recognition_authentication(&face_creds("tx-auth"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(h.liveness.launches(), 0);
    assert!(!h.bridge.liveness.is_face_recognition_in_progress());

    // Photo authentication is server-side and needs no camera.
    let bridge = h.bridge.clone();
    let pending = tokio::spawn(async move {
        bridge
            .liveness
            .authenticate_user_with_photo(&face_creds("tx-auth"), IMAGE)
            .await
    });
    let sink = h.liveness.next_sink().await;
    assert!(sink.cancelled_by_user());
    assert!(pending.await.unwrap().unwrap().is_cancelled());
}

// ── NFC ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mrz_credentials_feed_the_chip_read() {
    let h = Harness::new();
    let bac = sample_mrz().bac_credentials();
    let bridge = h.bridge.clone();
    let pending = tokio::spawn(async move {
        bridge
            .nfc
            .start_nfc_reading_with_bac(&bac, SERVER, "tx-chip")
            .await
    });
    let sink = h.nfc.next_sink().await;
    let NfcRequest::ReadPassport(creds) = h.nfc.last_request() else {
        panic!("expected a passport read");
    };
    assert_eq!(creds.document_number, "U12345678");
    assert_eq!(creds.expiry_date, "300101");

    sink.progress(NfcEvent::SessionBegan);
    sink.progress(NfcEvent::Progress { percent: 50 });
    sink.succeed(NfcPayload::Passport(PassportData {
        transaction_id: "tx-chip".into(),
        first_name: "JANE".into(),
        last_name: "DOE".into(),
        document_number: "U12345678".into(),
        nationality: "TUR".into(),
        date_of_birth: "900101".into(),
        gender: "F".into(),
        personal_number: String::new(),
        passive_authentication: ChipAuthentication::Passed,
        active_authentication: ChipAuthentication::NotSupported,
        face_image: None,
    }));
    let result = pending.await.unwrap().unwrap();
    assert!(matches!(result.payload, Some(NfcPayload::Passport(_))));
}

#[tokio::test]
async fn nfc_availability_follows_gate() {
    let h = Harness::new();
    assert!(h.bridge.nfc.is_nfc_available().await);
    assert!(h.bridge.nfc.is_nfc_enabled().await);

    h.gate.set(Capability::Nfc, PermissionState::Denied);
    assert!(h.bridge.nfc.is_nfc_available().await);
    assert!(!h.bridge.nfc.is_nfc_enabled().await);
}

#[tokio::test]
async fn antenna_location_needs_only_a_server() {
    let h = Harness::new();
    h.gate.set(Capability::Nfc, PermissionState::Denied);
    assert!(h.bridge.nfc.get_nfc_location("").await.is_err());

    let bridge = h.bridge.clone();
    let pending = tokio::spawn(async move { bridge.nfc.get_nfc_location(SERVER).await });
    let sink = h.nfc.next_sink().await;
    sink.succeed(NfcPayload::AntennaLocation(udentify_core::nfc::AntennaLocation {
        location: 2,
        description: "upper back".into(),
    }));
    assert!(pending.await.unwrap().unwrap().success);
}

// ── Video call ─────────────────────────────────────────────────────────────

fn call_creds() -> udentify_core::KeyValueMap {
    map(json!({
        "serverURL": SERVER,
        "wssURL": "wss://call.example.com/ws",
        "userID": "user-1",
        "transactionID": "tx-call",
        "clientName": "demo",
    }))
}

#[tokio::test]
async fn call_status_tracks_user_state() {
    let h = Harness::new();
    assert_eq!(h.bridge.video_call.get_video_call_status(), CallStatus::Idle);
    assert!(!h.bridge.video_call.toggle_camera().unwrap());

    let bridge = h.bridge.clone();
    let pending =
        tokio::spawn(async move { bridge.video_call.start_video_call(&call_creds()).await });
    let sink = h.video_call.next_sink().await;
    assert_eq!(
        h.bridge.video_call.get_video_call_status(),
        CallStatus::Connecting
    );

    sink.progress(VideoCallEvent::UserStateChanged {
        state: "connected".into(),
    });
    sink.progress(VideoCallEvent::ParticipantStateChanged {
        participant: ParticipantType::Agent,
        state: "videoTrackActivated".into(),
    });
    assert_eq!(
        h.bridge.video_call.get_video_call_status(),
        CallStatus::Connected
    );

    // Camera starts on, so the first toggle turns it off.
    assert!(!h.bridge.video_call.toggle_camera().unwrap());
    assert!(h.bridge.video_call.toggle_camera().unwrap());
    assert!(!h.bridge.video_call.toggle_microphone().unwrap());
    assert!(h.bridge.video_call.switch_camera().unwrap());

    sink.succeed(VideoCallPayload {
        transaction_id: "tx-call".into(),
        end: CallEnd::Completed,
        status: CallStatus::Completed,
    });
    let result = pending.await.unwrap().unwrap();
    assert!(result.success);
    assert_eq!(h.bridge.video_call.get_video_call_status(), CallStatus::Idle);
}

#[tokio::test]
async fn call_requires_microphone() {
    let h = Harness::new();
    h.gate.set(Capability::Microphone, PermissionState::PermanentlyDenied);
    let err = h
        .bridge
        .video_call
        .start_video_call(&call_creds())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert_eq!(h.video_call.launches(), 0);
}

#[tokio::test]
async fn ending_a_call_cancels_the_session() {
    let h = Harness::new();
    let bridge = h.bridge.clone();
    let pending =
        tokio::spawn(async move { bridge.video_call.start_video_call(&call_creds()).await });
    let _sink = h.video_call.next_sink().await;

    assert!(h.bridge.video_call.end_video_call());
    assert!(pending.await.unwrap().unwrap().is_cancelled());
    assert_eq!(h.video_call.teardowns(), 1);
    assert!(!h.bridge.video_call.dismiss_video_call());
}

// ── Wire shape ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn call_result_and_event_wire_shape() {
    let h = Harness::new();
    let mut events = h.bridge.subscribe(None);
    let bridge = h.bridge.clone();
    let pending =
        tokio::spawn(async move { bridge.video_call.start_video_call(&call_creds()).await });
    let sink = h.video_call.next_sink().await;
    sink.progress(VideoCallEvent::UserStateChanged {
        state: "connected".into(),
    });
    sink.succeed(VideoCallPayload {
        transaction_id: "tx-call".into(),
        end: CallEnd::Dismissed,
        status: CallStatus::Completed,
    });
    let result = pending.await.unwrap().unwrap();

    let event: ProgressEvent = events.try_recv().unwrap();
    insta::assert_json_snapshot!(event, @r###"
    {
      "modality": "videoCall",
      "sessionId": 1,
      "type": "userStateChanged",
      "state": "connected"
    }
    "###);
    insta::assert_json_snapshot!(result, @r###"
    {
      "success": true,
      "payload": {
        "transactionID": "tx-call",
        "end": "dismissed",
        "status": "completed"
      }
    }
    "###);
}
