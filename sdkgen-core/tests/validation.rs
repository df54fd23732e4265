use sdkgen_core::validate::{validate_manifest_input, validate_plugin_input};
use sdkgen_core::{GeneratorInput, ValidationError};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

struct TestCase {
    name: &'static str,
    files: Vec<&'static str>,
    expected: &'static str,
}

fn kind(result: &Result<(), ValidationError>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(ValidationError::NoProtoFiles) => "empty",
        Err(ValidationError::PathTraversal(_)) => "traversal",
        Err(ValidationError::AbsolutePath(_)) => "absolute",
        Err(ValidationError::NonUtf8Path(_)) => "non-utf8",
        Err(ValidationError::InvalidExtension(_)) => "extension",
        Err(ValidationError::MissingManifest(_)) => "manifest",
    }
}

#[test]
fn test_plugin_validation_table_driven() {
    let test_cases = vec![
        TestCase {
            name: "single root file",
            files: vec!["test.proto"],
            expected: "ok",
        },
        TestCase {
            name: "nested files",
            files: vec!["user/v1/user.proto", "common/types.proto"],
            expected: "ok",
        },
        TestCase {
            name: "empty list",
            files: vec![],
            expected: "empty",
        },
        TestCase {
            name: "parent escape",
            files: vec!["../secret.proto"],
            expected: "traversal",
        },
        TestCase {
            name: "escape after folding",
            files: vec!["a/../../secret.proto"],
            expected: "traversal",
        },
        TestCase {
            name: "absolute path",
            files: vec!["/etc/passwd.proto"],
            expected: "absolute",
        },
        TestCase {
            name: "wrong extension",
            files: vec!["user.proto.bak"],
            expected: "extension",
        },
        TestCase {
            name: "one bad file among good ones",
            files: vec!["a.proto", "b.txt", "c.proto"],
            expected: "extension",
        },
    ];

    for tc in test_cases {
        // Output path intentionally absent: plugin validation must not require it.
        let input = GeneratorInput::new("/nonexistent/repo", "/nonexistent/out")
            .with_proto_files(tc.files.clone());
        let result = validate_plugin_input(&input);
        assert_eq!(kind(&result), tc.expected, "{}: got {result:?}", tc.name);
    }
}

#[test]
fn test_first_bad_file_is_reported() {
    let input = GeneratorInput::new("repo", "out").with_proto_files(["a.proto", "b.txt", "c.md"]);
    match validate_plugin_input(&input) {
        Err(ValidationError::InvalidExtension(file)) => assert_eq!(file, PathBuf::from("b.txt")),
        other => panic!("expected extension error for b.txt, got {other:?}"),
    }
}

#[test]
fn test_error_names_offending_file() {
    let input = GeneratorInput::new("repo", "out").with_proto_files(["../../etc/shadow.proto"]);
    let err = validate_plugin_input(&input).unwrap_err();
    assert!(
        err.to_string().contains("../../etc/shadow.proto"),
        "Error should name the file: {err}"
    );
}

#[test]
fn test_manifest_validation_ignores_file_list() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("buf.gen.yaml"), "version: v2\n").unwrap();

    let input = GeneratorInput::new(tmp.path(), tmp.path().join("out"))
        .with_proto_files(["../not-checked.txt"]);
    assert!(validate_manifest_input(&input, "buf.gen.yaml").is_ok());
}

#[test]
fn test_manifest_validation_requires_manifest_at_root() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("nested")).unwrap();
    fs::write(tmp.path().join("nested/buf.gen.yaml"), "version: v2\n").unwrap();

    let input = GeneratorInput::new(tmp.path(), tmp.path().join("out"));
    let err = validate_manifest_input(&input, "buf.gen.yaml").unwrap_err();
    assert!(matches!(err, ValidationError::MissingManifest(_)));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_proto_path_is_rejected_before_reaching_the_compiler() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let bad = PathBuf::from(OsStr::from_bytes(b"api/v1/\xfe\xff.proto"));
    let input = GeneratorInput::new("repo", "out").with_proto_files([PathBuf::from("ok.proto"), bad.clone()]);
    let result = validate_plugin_input(&input);
    assert_eq!(kind(&result), "non-utf8");
    match result {
        Err(ValidationError::NonUtf8Path(file)) => assert_eq!(file, bad),
        other => panic!("expected non-UTF-8 error, got {other:?}"),
    }
}
