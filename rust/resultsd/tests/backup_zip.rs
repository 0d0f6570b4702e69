use resultsd::backup;
use resultsd::store::{DataStore, DbPath, SqliteStore};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn zip_export_and_import_roundtrip() {
    let out_dir = temp_dir("resultsd-backup-out");
    let src = SqliteStore::open_in_memory().expect("src store");
    let tree = json!({
        "teachers": [{ "id": "t1", "name": "Ada" }],
        "classSubjects": { "7A": ["Maths"] },
        "users": { "u1": { "role": "admin" } }
    });
    src.set(&DbPath::root(), tree.clone()).expect("seed");

    let bundle_path = out_dir.join("results.bundle.zip");
    let export = backup::export_bundle(&src, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 2);
    assert_eq!(export.top_level_keys, 3);

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    assert!(manifest.contains("treeSha256"));
    archive
        .by_name("data/tree.json")
        .expect("tree entry in bundle");

    let dst = SqliteStore::open_in_memory().expect("dst store");
    dst.set(&DbPath::parse("marks").expect("path"), json!([1]))
        .expect("pre-existing data");
    let import = backup::import_bundle(&dst, &bundle_path).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);
    assert_eq!(dst.get(&DbPath::root()).expect("root"), tree);

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn tampered_bundle_is_rejected() {
    let out_dir = temp_dir("resultsd-backup-tampered");
    let bundle_path = out_dir.join("tampered.zip");
    {
        let f = File::create(&bundle_path).expect("create");
        let mut zip = zip::ZipWriter::new(f);
        let opts = zip::write::FileOptions::default();
        zip.start_file("manifest.json", opts).expect("start");
        zip.write_all(
            json!({ "format": backup::BUNDLE_FORMAT_V1, "treeSha256": "00" })
                .to_string()
                .as_bytes(),
        )
        .expect("write manifest");
        zip.start_file("data/tree.json", opts).expect("start");
        zip.write_all(b"{\"marks\":[1]}").expect("write tree");
        zip.finish().expect("finish");
    }

    let dst = SqliteStore::open_in_memory().expect("dst store");
    let err = backup::import_bundle(&dst, &bundle_path).unwrap_err();
    assert!(err.to_string().contains("checksum"));
    assert_eq!(
        dst.get(&DbPath::root()).expect("root"),
        serde_json::Value::Null
    );

    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn plain_json_import_is_supported() {
    let out_dir = temp_dir("resultsd-backup-plain");
    let plain = out_dir.join("tree.json");
    std::fs::write(&plain, br#"{"students":["Grace","Linus"]}"#).expect("write plain json");

    let dst = SqliteStore::open_in_memory().expect("dst store");
    let import = backup::import_bundle(&dst, &plain).expect("import plain json");
    assert_eq!(import.bundle_format_detected, backup::PLAIN_JSON_FORMAT);
    assert_eq!(
        dst.get(&DbPath::parse("students").expect("path")).expect("get"),
        json!(["Grace", "Linus"])
    );

    let _ = std::fs::remove_dir_all(out_dir);
}
