fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use pushdeck_protocol::{
        BatchUploadRequest, ProgressEvent, UnitErrorEvent, UnitStatus, UploadOutcome,
        UploadRequest, UploadStage,
    };
    use serde_json::json;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  UI:   {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Requests ---

    #[test]
    fn fixture_upload_request() {
        let req: UploadRequest = roundtrip_test("upload_request.json");
        assert_eq!(req.local_path, "/home/ops/photos");
        assert_eq!(req.credentials.address(), "192.168.1.10:22");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn fixture_batch_upload_request() {
        let req: BatchUploadRequest = roundtrip_test("batch_upload_request.json");
        assert_eq!(req.folder_paths.len(), 2);
        assert_eq!(req.credentials.port, 2222);
    }

    #[test]
    fn request_without_port_defaults_to_22() {
        let req: UploadRequest = serde_json::from_value(json!({
            "localPath": "a.txt",
            "remotePath": "/srv",
            "host": "h",
            "username": "u",
            "password": "p"
        }))
        .unwrap();
        assert_eq!(req.credentials.port, 22);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let req: UploadRequest = serde_json::from_value(load_fixture("upload_request.json")).unwrap();
        let shown = format!("{req:?}");
        assert!(!shown.contains("secret"));
    }

    // --- Events ---

    #[test]
    fn fixture_progress_event() {
        let event: ProgressEvent = roundtrip_test("progress_event.json");
        assert_eq!(event, ProgressEvent::new(75_000, 150_000));
    }

    #[test]
    fn fixture_unit_error_event() {
        let event: UnitErrorEvent = roundtrip_test("unit_error_event.json");
        assert_eq!(event.unit, "docs");
    }

    #[test]
    fn stage_names() {
        let names: Vec<serde_json::Value> = [
            UploadStage::Sizing,
            UploadStage::Compressing,
            UploadStage::Connecting,
            UploadStage::Transferring,
            UploadStage::Verifying,
            UploadStage::Cleanup,
            UploadStage::Done,
            UploadStage::Failed,
        ]
        .iter()
        .map(|s| serde_json::to_value(s).unwrap())
        .collect();
        assert_eq!(
            names,
            vec![
                json!("sizing"),
                json!("compressing"),
                json!("connecting"),
                json!("transferring"),
                json!("verifying"),
                json!("cleanup"),
                json!("done"),
                json!("failed"),
            ]
        );
    }

    #[test]
    fn unit_status_names() {
        assert_eq!(serde_json::to_value(UnitStatus::Pending).unwrap(), json!("pending"));
        assert_eq!(
            serde_json::to_value(UnitStatus::InProgress).unwrap(),
            json!("in-progress")
        );
        assert_eq!(serde_json::to_value(UnitStatus::Verified).unwrap(), json!("verified"));
        assert_eq!(serde_json::to_value(UnitStatus::Failed).unwrap(), json!("failed"));
    }

    // --- Outcomes ---

    #[test]
    fn fixture_upload_outcome_batch() {
        let outcome: UploadOutcome = roundtrip_test("upload_outcome_batch.json");
        assert!(outcome.success);
        assert_eq!(outcome.successful_units, vec!["site".to_string()]);
    }

    #[test]
    fn fixture_upload_outcome_single() {
        let outcome: UploadOutcome = roundtrip_test("upload_outcome_single.json");
        assert_eq!(outcome, UploadOutcome::succeeded("upload succeeded"));
    }
}
