const COMMANDS: &[&str] = &[
    // Shared
    "check_permissions",
    "request_permissions",
    "configure_ui_settings",
    "set_localization",
    // Liveness
    "start_face_recognition_registration",
    "start_face_recognition_authentication",
    "start_active_liveness",
    "start_hybrid_liveness",
    "start_selfie_capture",
    "perform_face_recognition_with_selfie",
    "register_user_with_photo",
    "authenticate_user_with_photo",
    "start_face_recognition_identification",
    "add_user_to_list",
    "delete_user_from_list",
    "cancel_face_recognition",
    "is_face_recognition_in_progress",
    // MRZ
    "start_mrz_camera",
    "process_mrz_image",
    "cancel_mrz_scanning",
    "is_mrz_scanning_in_progress",
    // NFC
    "is_nfc_available",
    "is_nfc_enabled",
    "start_nfc_reading",
    "start_nfc_reading_with_bac",
    "get_nfc_location",
    "cancel_nfc_reading",
    "is_nfc_reading_in_progress",
    // OCR
    "start_ocr_scanning",
    "start_hologram_camera",
    "perform_ocr",
    "perform_document_liveness",
    "perform_ocr_and_document_liveness",
    "perform_hologram_check",
    "cancel_ocr",
    "is_ocr_in_progress",
    // Video call
    "start_video_call",
    "end_video_call",
    "dismiss_video_call",
    "get_video_call_status",
    "toggle_camera",
    "switch_camera",
    "toggle_microphone",
    "set_video_call_config",
    "is_video_call_in_progress",
];

fn main() {
    tauri_plugin::Builder::new(COMMANDS).build();
}
