use super::*;
use crate::error::MunkiError;
use crate::pkginfo::worker_pool;
use crate::repo::MemoryRepo;
use crate::testing::{ManifestDoc, add_manifest};

fn pair(name: &str, version: &str) -> (String, String) {
    (name.to_string(), version.to_string())
}

#[test]
fn test_references_include_conditional_items() {
    let doc = ManifestDoc::new()
        .list("managed_installs", &["Firefox"])
        .list("optional_installs", &["Slack"])
        .conditional(
            "machine_type == \"laptop\"",
            ManifestDoc::new()
                .list("managed_updates", &["TunnelBlick"])
                .conditional(
                    "arch == \"arm64\"",
                    ManifestDoc::new().list("managed_uninstalls", &["Rosetta Thing-1.0"]),
                ),
        );
    let manifest = Manifest::parse("manifests/site_default", &doc.to_bytes()).unwrap();

    assert_eq!(manifest.conditional_items.len(), 1);
    assert_eq!(
        manifest.conditional_items[0].condition.as_deref(),
        Some("machine_type == \"laptop\"")
    );
    assert_eq!(
        manifest.references(),
        vec!["Firefox", "Slack", "TunnelBlick", "Rosetta Thing-1.0"]
    );
}

#[test]
fn test_scan_collects_names_and_pins() {
    let repo = MemoryRepo::new();
    add_manifest(
        &repo,
        "site_default",
        &ManifestDoc::new().list("managed_installs", &["Foo-1.0", "Bar", "Baz--2.0-1"]),
    );
    add_manifest(
        &repo,
        "lab/room1",
        &ManifestDoc::new().conditional(
            "os_vers_minor > 12",
            ManifestDoc::new().list("managed_installs", &["Qux-3.1"]),
        ),
    );

    let pool = worker_pool(2).unwrap();
    let scan = scan_manifests(&repo, &pool, &Logger::default()).unwrap();

    assert_eq!(scan.manifest_count, 2);
    let names: Vec<&str> = scan.referenced_names.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["Bar", "Baz", "Foo", "Qux"]);
    assert!(scan.pinned_versions.contains(&pair("Foo", "1.0")));
    assert!(scan.pinned_versions.contains(&pair("Baz", "2.0-1")));
    assert!(scan.pinned_versions.contains(&pair("Qux", "3.1")));
    assert_eq!(scan.pinned_versions.len(), 3);
    assert!(scan.report.is_empty());
}

#[test]
fn test_scan_skips_bad_manifests() {
    let repo = MemoryRepo::new();
    repo.insert("manifests/broken", b"<plist><dict><key>".to_vec());
    add_manifest(
        &repo,
        "locked",
        &ManifestDoc::new().list("managed_installs", &["Hidden"]),
    );
    repo.fail_on("manifests/locked");
    add_manifest(
        &repo,
        "good",
        &ManifestDoc::new().list("managed_installs", &["Foo"]),
    );

    let pool = worker_pool(1).unwrap();
    let scan = scan_manifests(&repo, &pool, &Logger::default()).unwrap();

    assert_eq!(scan.manifest_count, 1);
    assert!(scan.referenced_names.contains("Foo"));
    assert!(!scan.referenced_names.contains("Hidden"));
    assert_eq!(scan.report.errors.len(), 2);
    assert!(
        scan.report
            .errors
            .iter()
            .any(|err| matches!(err, MunkiError::Parse { identifier, .. } if identifier == "manifests/broken"))
    );
}

#[test]
fn test_scan_of_empty_repository() {
    let repo = MemoryRepo::new();
    let pool = worker_pool(1).unwrap();
    let scan = scan_manifests(&repo, &pool, &Logger::default()).unwrap();
    assert_eq!(scan.manifest_count, 0);
    assert!(scan.referenced_names.is_empty());
}
