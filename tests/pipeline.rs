//! End-to-end pipeline tests over real temp directories, with fake host,
//! renderer and encoder services standing in for a live application.

use async_trait::async_trait;
use modelport::{
    check_batch, export_batch, export_directory, DocumentHost, EncoderService, EncodeOptions,
    ExportConfig, ExportServices, ExportStatus, HostDocId, LocalStorage, ModelDocument,
    RendererService, ServiceError, ViewConfig,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const PNG_BYTES: &[u8] = b"\x89PNG fake preview";
const GLTF_BYTES: &[u8] = b"{\"asset\":{\"version\":\"2.0\"}}";

// ── Fakes ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct HostState {
    active: Option<HostDocId>,
    open: Vec<(HostDocId, Option<PathBuf>)>,
    next_id: u64,
    loaded: Vec<(PathBuf, ModelDocument)>,
    selections: Vec<HostDocId>,
    saves: usize,
}

struct FakeHost {
    state: Mutex<HostState>,
    fail_select: bool,
}

impl FakeHost {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(HostState {
                next_id: 100,
                ..Default::default()
            }),
            fail_select: false,
        })
    }

    /// A host whose active document `id` is saved at `path`.
    fn with_active(id: u64, path: &Path) -> Arc<Self> {
        let host = Self::new();
        {
            let mut s = host.state.lock().unwrap();
            s.active = Some(HostDocId(id));
            s.open = vec![(HostDocId(id), Some(path.to_path_buf()))];
        }
        host
    }

    fn failing_select(self: Arc<Self>) -> Arc<Self> {
        let s = self.state.lock().unwrap();
        let rebuilt = Self {
            state: Mutex::new(HostState {
                active: s.active,
                open: s.open.clone(),
                next_id: s.next_id,
                loaded: Vec::new(),
                selections: Vec::new(),
                saves: 0,
            }),
            fail_select: true,
        };
        drop(s);
        Arc::new(rebuilt)
    }

    fn loaded(&self) -> Vec<(PathBuf, ModelDocument)> {
        self.state.lock().unwrap().loaded.clone()
    }

    fn selections(&self) -> Vec<HostDocId> {
        self.state.lock().unwrap().selections.clone()
    }

    fn active(&self) -> Option<HostDocId> {
        self.state.lock().unwrap().active
    }

    fn saves(&self) -> usize {
        self.state.lock().unwrap().saves
    }
}

#[async_trait]
impl DocumentHost for FakeHost {
    async fn active_document(&self) -> Option<HostDocId> {
        self.state.lock().unwrap().active
    }

    async fn save_active_if_modified(&self) -> Result<(), ServiceError> {
        self.state.lock().unwrap().saves += 1;
        Ok(())
    }

    async fn load_document(
        &self,
        doc: &ModelDocument,
        path: &Path,
    ) -> Result<HostDocId, ServiceError> {
        let mut s = self.state.lock().unwrap();
        let id = HostDocId(s.next_id);
        s.next_id += 1;
        s.loaded.push((path.to_path_buf(), doc.clone()));
        s.open.push((id, Some(path.to_path_buf())));
        s.active = Some(id);
        Ok(id)
    }

    async fn select_document(&self, id: HostDocId) -> Result<(), ServiceError> {
        if self.fail_select {
            return Err(ServiceError::new("host refused to switch documents"));
        }
        let mut s = self.state.lock().unwrap();
        s.selections.push(id);
        s.active = Some(id);
        Ok(())
    }

    async fn open_documents(&self) -> Vec<(HostDocId, Option<PathBuf>)> {
        self.state.lock().unwrap().open.clone()
    }
}

struct FakeRenderer;

#[async_trait]
impl RendererService for FakeRenderer {
    async fn flush_updates(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn capture_viewport(&self, _view: &ViewConfig) -> Result<Vec<u8>, ServiceError> {
        Ok(PNG_BYTES.to_vec())
    }
}

struct FakeEncoder {
    payload: Vec<u8>,
}

#[async_trait]
impl EncoderService for FakeEncoder {
    async fn encode(&self, _options: &EncodeOptions) -> Result<Vec<u8>, ServiceError> {
        Ok(self.payload.clone())
    }
}

fn services(host: Arc<FakeHost>) -> ExportServices {
    services_with_encoder(host, GLTF_BYTES.to_vec())
}

fn services_with_encoder(host: Arc<FakeHost>, payload: Vec<u8>) -> ExportServices {
    ExportServices {
        storage: Arc::new(LocalStorage),
        host,
        renderer: Arc::new(FakeRenderer),
        encoder: Arc::new(FakeEncoder { payload }),
    }
}

// ── Document builders ────────────────────────────────────────────────────

fn grounded_at(y: f64) -> serde_json::Value {
    json!({
        "meta": { "format_version": "4.5" },
        "elements": [
            {
                "name": "body",
                "from": [0.0, y, 0.0],
                "to": [4.0, y + 4.0, 4.0],
                "origin": [0.0, y, 0.0]
            },
            {
                "name": "anchor_root",
                "from": [0.0, y, 0.0],
                "to": [0.0, y, 0.0],
                "origin": [0.0, y, 0.0]
            }
        ]
    })
}

fn write_doc(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path
}

// ── Full pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn ungrounded_model_is_exported_with_warnings() {
    let dir = TempDir::new().unwrap();
    let doc_path = write_doc(dir.path(), "chair.bbmodel", &grounded_at(4.0));

    let host = FakeHost::with_active(7, &dir.path().join("open.bbmodel"));
    let svc = services(host.clone());
    let config = ExportConfig::default();

    let report = export_batch(&[doc_path.clone()], &svc, &config).await;

    assert_eq!(report.stats.total, 1);
    assert_eq!(report.stats.warned, 1);
    assert_eq!(report.stats.failed, 0);

    let record = &report.records[0];
    assert_eq!(record.document, "chair");
    assert_eq!(record.status, ExportStatus::Warning);
    assert!(record.message.contains("grounded"), "got: {}", record.message);
    assert!(record.message.contains("no textures"));

    // The host received the normalized document, not the stored one.
    let loaded = host.loaded();
    assert_eq!(loaded.len(), 1);
    let anchor = &loaded[0].1.elements.as_ref().unwrap()[1];
    assert_eq!(anchor.from.unwrap(), [0.0, 0.0, 0.0]);
    assert_eq!(anchor.origin.unwrap(), [0.0, 0.0, 0.0]);

    // The stored file is untouched.
    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&doc_path).unwrap()).unwrap();
    assert_eq!(on_disk["elements"][1]["from"][1], 4.0);

    // Outputs live in output/<stem>/ next to the source.
    let out = dir.path().join("output").join("chair");
    assert_eq!(std::fs::read(out.join("chair.png")).unwrap(), PNG_BYTES);
    assert_eq!(std::fs::read(out.join("chair.gltf")).unwrap(), GLTF_BYTES);
    assert!(out.join("chair.bbmodel").exists());

    // The user's document was saved once and made active again.
    assert_eq!(host.saves(), 1);
    assert_eq!(host.selections(), vec![HostDocId(7)]);
    assert_eq!(host.active(), Some(HostDocId(7)));
}

#[tokio::test]
async fn empty_elements_is_a_validation_failure() {
    let dir = TempDir::new().unwrap();
    let doc_path = write_doc(dir.path(), "hollow.bbmodel", &json!({ "elements": [] }));

    let host = FakeHost::with_active(7, &dir.path().join("open.bbmodel"));
    let svc = services(host.clone());

    let report = export_batch(&[doc_path], &svc, &ExportConfig::default()).await;

    let record = &report.records[0];
    assert_eq!(record.status, ExportStatus::Error);
    assert!(record.message.contains("no elements"), "got: {}", record.message);

    // Validation failed before any host interaction.
    assert!(host.loaded().is_empty());
    assert!(host.selections().is_empty());
    assert!(!dir.path().join("output").exists());
}

#[tokio::test]
async fn mismatched_anchor_fails_and_names_the_anchor() {
    let dir = TempDir::new().unwrap();
    let doc_path = write_doc(
        dir.path(),
        "bad.bbmodel",
        &json!({
            "elements": [{
                "name": "anchor_hand",
                "from": [1.0, 1.0, 1.0],
                "to": [1.0, 1.0, 2.0],
                "origin": [1.0, 1.0, 1.0]
            }]
        }),
    );

    let host = FakeHost::new();
    let svc = services(host.clone());
    let report = export_batch(&[doc_path], &svc, &ExportConfig::default()).await;

    let record = &report.records[0];
    assert_eq!(record.status, ExportStatus::Error);
    assert!(record.message.contains("anchor_hand"));
    assert!(record.message.contains("mismatched coordinates"));
    assert!(host.loaded().is_empty());
}

#[tokio::test]
async fn missing_texture_file_fails_normalization() {
    let dir = TempDir::new().unwrap();
    let mut doc = grounded_at(0.0);
    doc["textures"] = json!([{
        "name": "skin",
        "relative_path": "./skin.png"
    }]);
    let doc_path = write_doc(dir.path(), "textured.bbmodel", &doc);

    let host = FakeHost::new();
    let svc = services(host.clone());
    let report = export_batch(&[doc_path], &svc, &ExportConfig::default()).await;

    let record = &report.records[0];
    assert_eq!(record.status, ExportStatus::Error);
    assert!(record.message.contains("skin"));
    assert!(record.message.contains("skin.png"));
    // Normalization failed before any host interaction.
    assert!(host.loaded().is_empty());
}

#[tokio::test]
async fn resolvable_texture_is_inlined_before_the_host_sees_it() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("skin.png"), b"png bytes").unwrap();

    let mut doc = grounded_at(0.0);
    doc["textures"] = json!([{
        "name": "skin",
        "relative_path": "./skin.png"
    }]);
    let doc_path = write_doc(dir.path(), "textured.bbmodel", &doc);

    let host = FakeHost::with_active(7, &dir.path().join("open.bbmodel"));
    let svc = services(host.clone());
    let report = export_batch(&[doc_path], &svc, &ExportConfig::default()).await;

    assert_eq!(report.records[0].status, ExportStatus::Warning);
    assert!(report.records[0].message.contains("Encoded texture"));

    let loaded = host.loaded();
    let texture = &loaded[0].1.textures.as_ref().unwrap()[0];
    assert!(texture.is_inline());
    assert!(texture
        .source
        .as_deref()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn empty_encoder_payload_fails_but_host_is_restored() {
    let dir = TempDir::new().unwrap();
    let doc_path = write_doc(dir.path(), "chair.bbmodel", &grounded_at(0.0));

    let host = FakeHost::with_active(9, &dir.path().join("open.bbmodel"));
    let svc = services_with_encoder(host.clone(), Vec::new());
    let report = export_batch(&[doc_path], &svc, &ExportConfig::default()).await;

    let record = &report.records[0];
    assert_eq!(record.status, ExportStatus::Error);
    assert!(record.message.contains("empty payload"), "got: {}", record.message);

    // Nothing reached storage.
    assert!(!dir.path().join("output").join("chair").join("chair.gltf").exists());

    // The failure did not skip the restore step.
    assert_eq!(host.selections(), vec![HostDocId(9)]);
    assert_eq!(host.active(), Some(HostDocId(9)));
}

#[tokio::test]
async fn one_bad_document_does_not_stop_the_batch() {
    let dir = TempDir::new().unwrap();
    let good_a = write_doc(dir.path(), "a.bbmodel", &grounded_at(0.0));
    let bad = write_doc(dir.path(), "b.bbmodel", &json!({ "not": "a model" }));
    let good_c = write_doc(dir.path(), "c.bbmodel", &grounded_at(0.0));

    let host = FakeHost::with_active(7, &dir.path().join("open.bbmodel"));
    let svc = services(host.clone());
    let report = export_batch(&[good_a, bad, good_c], &svc, &ExportConfig::default()).await;

    assert_eq!(report.stats.total, 3);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.records[1].status, ExportStatus::Error);
    assert_ne!(report.records[0].status, ExportStatus::Error);
    assert_ne!(report.records[2].status, ExportStatus::Error);
    assert!(!report.all_failed());

    // Both good documents were exported.
    assert!(dir.path().join("output").join("a").join("a.gltf").exists());
    assert!(dir.path().join("output").join("c").join("c.gltf").exists());
}

#[tokio::test]
async fn restore_failure_is_a_report_warning_not_a_record_failure() {
    let dir = TempDir::new().unwrap();
    let doc_path = write_doc(dir.path(), "chair.bbmodel", &grounded_at(0.0));

    let host = FakeHost::with_active(7, &dir.path().join("open.bbmodel")).failing_select();
    let svc = services(host.clone());
    let report = export_batch(&[doc_path], &svc, &ExportConfig::default()).await;

    // The export itself completed.
    assert_ne!(report.records[0].status, ExportStatus::Error);
    assert_eq!(report.host_state_warnings.len(), 1);
    assert!(report.host_state_warnings[0].contains("chair"));
    assert!(report.host_state_warnings[0].contains("restore"));
}

#[tokio::test]
async fn output_root_overrides_placement() {
    let dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let doc_path = write_doc(dir.path(), "chair.bbmodel", &grounded_at(0.0));

    let host = FakeHost::with_active(7, &dir.path().join("open.bbmodel"));
    let svc = services(host);
    let config = ExportConfig::builder()
        .output_root(out_dir.path())
        .build()
        .unwrap();

    export_batch(&[doc_path], &svc, &config).await;

    assert!(out_dir.path().join("chair").join("chair.png").exists());
    assert!(!dir.path().join("output").exists());
}

// ── Directory discovery ──────────────────────────────────────────────────

#[tokio::test]
async fn export_directory_scans_next_to_the_active_document() {
    let dir = TempDir::new().unwrap();
    let active_path = write_doc(dir.path(), "open.bbmodel", &grounded_at(0.0));
    write_doc(dir.path(), "other.bbmodel", &grounded_at(0.0));
    std::fs::write(dir.path().join("notes.txt"), b"not a model").unwrap();

    let host = FakeHost::with_active(7, &active_path);
    let svc = services(host);
    let report = export_directory(&svc, &ExportConfig::default())
        .await
        .unwrap();

    assert_eq!(report.stats.total, 2);
    assert_eq!(report.stats.failed, 0);
    let names: Vec<_> = report.records.iter().map(|r| r.document.as_str()).collect();
    assert_eq!(names, ["open", "other"]);
}

#[tokio::test]
async fn export_directory_requires_a_saved_document() {
    let host = FakeHost::new();
    let svc = services(host);
    let err = export_directory(&svc, &ExportConfig::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Save the active document"));
}

// ── Host-free checking ───────────────────────────────────────────────────

#[tokio::test]
async fn check_batch_reports_without_touching_anything() {
    let dir = TempDir::new().unwrap();
    let good = write_doc(dir.path(), "good.bbmodel", &grounded_at(0.0));
    let bad = write_doc(dir.path(), "bad.bbmodel", &json!({ "elements": [] }));

    let report = check_batch(&[good, bad], &LocalStorage, &ExportConfig::default()).await;

    assert_eq!(report.stats.total, 2);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.records[0].status, ExportStatus::Warning);
    assert!(report.records[0].message.contains("no textures"));
    assert_eq!(report.records[1].status, ExportStatus::Error);

    // Checking never writes outputs.
    assert!(!dir.path().join("output").exists());
}

#[tokio::test]
async fn check_batch_flags_unparseable_documents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.bbmodel");
    std::fs::write(&path, b"{ not json").unwrap();

    let report = check_batch(&[path], &LocalStorage, &ExportConfig::default()).await;
    assert_eq!(report.records[0].status, ExportStatus::Error);
    assert!(report.records[0].message.contains("parse"));
}
