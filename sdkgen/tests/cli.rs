use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn sdkgen() -> Command {
    let mut cmd = Command::cargo_bin("sdkgen").expect("Binary exists");
    cmd.env_remove("SDKGEN_PROTOC").env_remove("SDKGEN_BUF");
    cmd
}

#[test]
fn list_prints_every_builtin_sdk_with_directory() {
    sdkgen()
        .arg("list")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("go\tgo\n")
                .and(predicate::str::contains("go-grpc\tgo-grpc"))
                .and(predicate::str::contains("ts-connect\ttypescript-connect"))
                .and(predicate::str::contains("buf\tbuf"))
                .and(predicate::str::contains("docs\tdocs")),
        );
}

#[test]
fn detect_prefers_buf_manifest() {
    let repo = tempdir().unwrap();
    fs::write(repo.path().join("buf.gen.yaml"), "version: v2\n").unwrap();
    fs::write(repo.path().join("a.proto"), "syntax = \"proto3\";\n").unwrap();

    sdkgen()
        .arg("detect")
        .arg("--repo")
        .arg(repo.path())
        .assert()
        .success()
        .stdout("buf\n");
}

#[test]
fn detect_fails_without_schemas_or_manifest() {
    let repo = tempdir().unwrap();

    sdkgen()
        .arg("detect")
        .arg("--repo")
        .arg(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no applicable generator"));
}

#[test]
fn generate_fails_on_missing_config() {
    sdkgen()
        .arg("generate")
        .arg("--config")
        .arg("/nonexistent/sdkgen.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

/// Writes an executable stand-in for protoc that records its arguments
/// (one per line) into `args.txt` in its working directory.
#[cfg(unix)]
fn fake_protoc(dir: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let script = dir.join("fake-protoc");
    fs::write(&script, "#!/bin/sh\nprintf '%s\\n' \"$@\" > args.txt\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[cfg(unix)]
#[test]
fn generate_go_runs_compiler_with_sorted_files() {
    let tools = tempdir().unwrap();
    let repo = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::create_dir_all(repo.path().join("sub")).unwrap();
    fs::write(repo.path().join("sub/b.proto"), "syntax = \"proto3\";\n").unwrap();
    fs::write(repo.path().join("a.proto"), "syntax = \"proto3\";\n").unwrap();

    let config = tools.path().join("sdkgen.yaml");
    fs::write(
        &config,
        format!(
            "repository: {}\noutput_dir: {}\nsdks: [go]\ntimeout_secs: 30\n",
            repo.path().display(),
            out.path().display()
        ),
    )
    .unwrap();

    sdkgen()
        .env("SDKGEN_PROTOC", fake_protoc(tools.path()))
        .arg("generate")
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"files_count\": 2"));

    let go_out = out.path().join("go");
    assert!(go_out.is_dir(), "Output subdirectory should be created");

    let args = fs::read_to_string(repo.path().join("args.txt")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(
        args,
        vec![
            format!("--proto_path={}", repo.path().display()).as_str(),
            format!("--go_out={}", go_out.display()).as_str(),
            "--go_opt=paths=source_relative",
            "--go_opt=Ma.proto=./",
            "--go_opt=Msub/b.proto=./sub",
            "a.proto",
            "sub/b.proto",
        ]
    );
}

#[cfg(unix)]
#[test]
fn generate_reports_compiler_stderr_on_failure() {
    use std::os::unix::fs::PermissionsExt;
    let tools = tempdir().unwrap();
    let repo = tempdir().unwrap();
    fs::write(repo.path().join("a.proto"), "syntax = \"proto3\";\n").unwrap();

    let script = tools.path().join("failing-protoc");
    fs::write(&script, "#!/bin/sh\necho 'a.proto:1:1: Import \"x.proto\" was not found' >&2\nexit 1\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let config = tools.path().join("sdkgen.yaml");
    fs::write(
        &config,
        format!(
            "repository: {}\noutput_dir: {}\nsdks: [ts-es]\n",
            repo.path().display(),
            tools.path().join("out").display()
        ),
    )
    .unwrap();

    sdkgen()
        .env("SDKGEN_PROTOC", &script)
        .arg("generate")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("was not found"));
}

#[cfg(unix)]
#[test]
fn generate_resolves_relative_config_paths_from_working_directory() {
    let tools = tempdir().unwrap();
    let work = tempdir().unwrap();
    let root = work.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("schemas/api")).unwrap();
    fs::write(root.join("schemas/api/user.proto"), "syntax = \"proto3\";\n").unwrap();
    fs::write(
        root.join("sdkgen.yaml"),
        "repository: ./schemas\noutput_dir: ./gen\nsdks: [go]\n",
    )
    .unwrap();

    sdkgen()
        .current_dir(&root)
        .env("SDKGEN_PROTOC", fake_protoc(tools.path()))
        .arg("generate")
        .arg("--config")
        .arg("sdkgen.yaml")
        .assert()
        .success();

    let go_out = root.join("gen/go");
    assert!(go_out.is_dir(), "Output created relative to the working directory");
    assert!(!root.join("schemas/gen").exists());

    let args = fs::read_to_string(root.join("schemas/args.txt")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(args[0], format!("--proto_path={}", root.join("schemas").display()));
    assert_eq!(args[1], format!("--go_out={}", go_out.display()));
    assert_eq!(args.last(), Some(&"api/user.proto"));
}
