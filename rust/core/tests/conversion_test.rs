// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use cadport_core::{
    ArtifactStore, Catalog, Converter, Error, GeometryParser, GltfPackager, MeshBuffer,
    ObjGltfPackager, PackageOptions, ParseOutcome, PipelineStage, UploadedFile,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const STEP_BYTES: &[u8] = b"ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\nENDSEC;\nEND-ISO-10303-21;\n";

/// Parser returning a fixed outcome and recording what it was given
struct FakeParser {
    outcome: Result<ParseOutcome, String>,
    calls: AtomicUsize,
    last_input: std::sync::Mutex<Vec<u8>>,
}

impl FakeParser {
    fn returning(outcome: ParseOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(outcome),
            calls: AtomicUsize::new(0),
            last_input: Default::default(),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_input: Default::default(),
        })
    }
}

impl GeometryParser for FakeParser {
    fn parse(&self, bytes: &[u8]) -> anyhow::Result<ParseOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = bytes.to_vec();
        match &self.outcome {
            Ok(outcome) => Ok(outcome.clone()),
            Err(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

/// Packager counting calls, optionally failing
struct FakePackager {
    fail: bool,
    calls: AtomicUsize,
}

impl FakePackager {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            calls: AtomicUsize::new(0),
        })
    }
}

impl GltfPackager for FakePackager {
    fn package(&self, mesh_document: &Path, options: &PackageOptions) -> anyhow::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("packager exploded");
        }
        assert!(mesh_document.exists());
        assert_eq!(mesh_document.parent(), Some(options.output_directory.as_path()));
        Ok(json!({ "asset": { "version": "2.0" }, "source": mesh_document.file_name().unwrap().to_str() }))
    }
}

fn triangle_buffer() -> MeshBuffer {
    MeshBuffer::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2])
}

fn bracket_outcome() -> ParseOutcome {
    ParseOutcome::succeeded(vec![
        triangle_buffer(),
        MeshBuffer::new(vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0], vec![0, 1, 2]),
    ])
}

#[test]
fn test_bracket_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::open(tmp.path()).unwrap();
    let parser = FakeParser::returning(bracket_outcome());
    let packager = FakePackager::new(false);
    let converter = Converter::new(store, parser.clone(), packager.clone());

    let report = converter
        .convert(UploadedFile::new("bracket.step", STEP_BYTES.to_vec()))
        .unwrap();

    let dir = converter.store().root().join("bracket");
    assert_eq!(report.artifact_path, dir.join("bracket.gltf"));
    assert_eq!(std::fs::read(dir.join("bracket.step")).unwrap(), STEP_BYTES);
    assert_eq!(*parser.last_input.lock().unwrap(), STEP_BYTES);
    assert_eq!(parser.calls.load(Ordering::SeqCst), 1);
    assert_eq!(packager.calls.load(Ordering::SeqCst), 1);

    let obj = std::fs::read_to_string(dir.join("bracket.obj")).unwrap();
    let lines: Vec<&str> = obj.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[3], "f 1 2 3");
    assert_eq!(lines[7], "f 4 5 6");
    assert_eq!(
        lines.iter().filter(|l| l.starts_with("v ")).count(),
        6,
        "expected six vertex records"
    );

    let gltf: Value = serde_json::from_str(&std::fs::read_to_string(&report.artifact_path).unwrap()).unwrap();
    assert_eq!(gltf["source"], "bracket.obj");
}

#[test]
fn test_empty_parse_fails_without_packaging() {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::open(tmp.path()).unwrap();
    let packager = FakePackager::new(false);
    let converter = Converter::new(
        store,
        FakeParser::returning(ParseOutcome::succeeded(Vec::new())),
        packager.clone(),
    );

    let err = converter
        .convert(UploadedFile::new("empty.step", STEP_BYTES.to_vec()))
        .unwrap_err();

    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(err.stage(), Some(PipelineStage::Parse));
    assert_eq!(packager.calls.load(Ordering::SeqCst), 0);

    // The raw upload stays for diagnosis; nothing downstream was written
    let dir = tmp.path().join("empty");
    assert!(dir.join("empty.step").exists());
    assert!(!dir.join("empty.obj").exists());
    assert!(!dir.join("empty.gltf").exists());
}

#[test]
fn test_parser_error_carries_message() {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::open(tmp.path()).unwrap();
    let converter = Converter::new(store, FakeParser::failing("kernel crashed"), FakePackager::new(false));

    let err = converter
        .convert(UploadedFile::new("gear.step", STEP_BYTES.to_vec()))
        .unwrap_err();

    assert!(matches!(err, Error::Parse(_)));
    assert!(err.to_string().contains("kernel crashed"));
}

#[test]
fn test_package_failure_keeps_obj() {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::open(tmp.path()).unwrap();
    let converter = Converter::new(
        store,
        FakeParser::returning(bracket_outcome()),
        FakePackager::new(true),
    );

    let err = converter
        .convert(UploadedFile::new("bracket.step", STEP_BYTES.to_vec()))
        .unwrap_err();

    assert_eq!(err.stage(), Some(PipelineStage::Package));
    assert!(err.to_string().contains("packager exploded"));

    let dir = tmp.path().join("bracket");
    assert!(dir.join("bracket.obj").exists());
    assert!(!dir.join("bracket.gltf").exists());

    // Partial output must not appear in the catalog
    let catalog = Catalog::new(tmp.path(), "http://localhost:8080/api");
    assert!(catalog.list().unwrap().is_empty());
}

#[test]
fn test_reconversion_overwrites() {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::open(tmp.path()).unwrap();

    let single = Converter::new(
        store.clone(),
        FakeParser::returning(ParseOutcome::succeeded(vec![triangle_buffer()])),
        FakePackager::new(false),
    );
    single
        .convert(UploadedFile::new("bracket.step", STEP_BYTES.to_vec()))
        .unwrap();

    let double = Converter::new(store, FakeParser::returning(bracket_outcome()), FakePackager::new(false));
    double
        .convert(UploadedFile::new("bracket.step", b"second".to_vec()))
        .unwrap();

    let dir = tmp.path().join("bracket");
    assert_eq!(std::fs::read(dir.join("bracket.step")).unwrap(), b"second");
    let obj = std::fs::read_to_string(dir.join("bracket.obj")).unwrap();
    assert_eq!(obj.lines().count(), 8);
}

#[test]
fn test_native_packager_then_catalog() {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::open(tmp.path()).unwrap();
    let converter = Converter::new(
        store,
        FakeParser::returning(bracket_outcome()),
        Arc::new(ObjGltfPackager::default()),
    );
    let catalog = Catalog::new(converter.store().root(), "http://localhost:8080/api");
    assert!(catalog.list().unwrap().is_empty());

    let report = converter
        .convert(UploadedFile::new("bracket.step", STEP_BYTES.to_vec()))
        .unwrap();

    let gltf: Value = serde_json::from_slice(&catalog.read("bracket").unwrap()).unwrap();
    assert_eq!(gltf["asset"]["version"], "2.0");
    let total_indices: u64 = gltf["accessors"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["type"] == "SCALAR")
        .map(|a| a["count"].as_u64().unwrap())
        .sum();
    assert_eq!(total_indices, 6);

    // Visible on the very next listing
    let entries = catalog.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "bracket");
    assert_eq!(entries[0].size, std::fs::metadata(&report.artifact_path).unwrap().len());
    assert_eq!(catalog.resolve("bracket").unwrap(), report.artifact_path);
}

#[test]
fn test_resolve_missing_on_empty_root() {
    let tmp = TempDir::new().unwrap();
    let catalog = Catalog::new(tmp.path(), "http://localhost:8080/api");
    assert!(matches!(catalog.resolve("missing"), Err(Error::NotFound(_))));
}

#[test]
fn test_upload_named_like_artifact_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::open(tmp.path()).unwrap();
    let parser = FakeParser::failing("not a STEP file");
    let converter = Converter::new(store, parser.clone(), FakePackager::new(false));

    let err = converter
        .convert(UploadedFile::new("bracket.gltf", b"garbage".to_vec()))
        .unwrap_err();

    assert_eq!(err.stage(), Some(PipelineStage::Persist));
    assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    assert!(!converter.store().root().join("bracket").join("bracket.gltf").exists());

    let catalog = Catalog::new(converter.store().root(), "http://localhost:8080/api");
    assert!(catalog.list().unwrap().is_empty());
    assert!(matches!(catalog.read("bracket"), Err(Error::NotFound(_))));
}

#[test]
fn test_upload_named_like_mesh_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let store = ArtifactStore::open(tmp.path()).unwrap();
    let parser = FakeParser::returning(bracket_outcome());
    let converter = Converter::new(store, parser.clone(), FakePackager::new(false));

    let err = converter
        .convert(UploadedFile::new("bracket.OBJ", b"RAW-UPLOAD".to_vec()))
        .unwrap_err();

    assert!(matches!(err, Error::Persist(_)));
    assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    assert!(!converter.store().root().join("bracket").exists());
}
