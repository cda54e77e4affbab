//! CLI integration tests for drydock.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the drydock binary command.
fn drydock() -> Command {
    Command::cargo_bin("drydock").unwrap()
}

/// Lay out a plausible CUDA toolkit root: bin/nvcc, include/, lib64/.
fn fake_toolkit(tmp: &TempDir) -> PathBuf {
    let root = tmp.path().join("cuda");
    fs::create_dir_all(root.join("bin")).unwrap();
    fs::create_dir_all(root.join("include")).unwrap();
    fs::create_dir_all(root.join("lib64")).unwrap();
    fs::write(root.join("bin/nvcc"), "").unwrap();
    root
}

// ============================================================================
// drydock locate
// ============================================================================

#[test]
fn test_locate_from_env() {
    let tmp = TempDir::new().unwrap();
    let root = fake_toolkit(&tmp);

    drydock()
        .arg("locate")
        .env("CUDA_PATH", &root)
        .assert()
        .success()
        .stdout(predicate::str::contains(root.display().to_string()))
        .stdout(predicate::str::contains("nvcc"));
}

#[test]
fn test_locate_missing_include_reports_component() {
    let tmp = TempDir::new().unwrap();
    let root = fake_toolkit(&tmp);
    fs::remove_dir(root.join("include")).unwrap();

    drydock()
        .arg("locate")
        .env("CUDA_PATH", &root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("include"));
}

#[test]
fn test_locate_nothing_found_names_nvcc() {
    let tmp = TempDir::new().unwrap();
    let empty = tmp.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    drydock()
        .arg("locate")
        .env_remove("CUDA_PATH")
        .env("PATH", &empty)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nvcc"))
        .stderr(predicate::str::contains("CUDA_PATH"));
}

// ============================================================================
// drydock build (fake tools; unix only)
// ============================================================================

#[cfg(unix)]
mod build {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A fake compiler/linker: touches the file following `-o`.
    fn fake_tool(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let script = "#!/bin/sh\n\
             out=\"\"\n\
             prev=\"\"\n\
             for a in \"$@\"; do\n\
             \tif [ \"$prev\" = \"-o\" ]; then out=\"$a\"; fi\n\
             \tprev=\"$a\"\n\
             done\n\
             [ -n \"$out\" ] && : > \"$out\"\n\
             exit 0\n";
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn fake_project(tmp: &TempDir) -> PathBuf {
        let project = tmp.path().join("project");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("src/host.c"), "int h(void) { return 0; }").unwrap();
        fs::write(project.join("src/kernel.cu"), "__global__ void k() {}").unwrap();
        fs::write(
            project.join("drydock.toml"),
            r#"
            [extension]
            name = "_demo"
            sources = ["src/*.c", "src/*.cu"]
            libraries = ["cudart"]

            [flags]
            device = ["-arch=sm_30"]
            "#,
        )
        .unwrap();
        project
    }

    #[test]
    fn test_build_produces_objects_and_module() {
        let tmp = TempDir::new().unwrap();

        let root = fake_toolkit(&tmp);
        // the toolkit's nvcc must be runnable for the build
        fake_tool(&root.join("bin"), "nvcc");

        let bin = tmp.path().join("fakebin");
        fs::create_dir_all(&bin).unwrap();
        let cc = fake_tool(&bin, "cc");

        let project = fake_project(&tmp);

        drydock()
            .args(["build", "--manifest"])
            .arg(project.join("drydock.toml"))
            .env("CUDA_PATH", &root)
            .env("CC", &cc)
            .env("CXX", &cc)
            .assert()
            .success()
            .stdout(predicate::str::contains("built:"));

        assert!(project.join("build/host.o").exists());
        assert!(project.join("build/kernel.o").exists());
        assert!(project.join("dist/_demo.so").exists());

        // sources are recompiled, so the objects are newer and the module
        // links again; the link-level skip is exercised at the unit level
        drydock()
            .args(["build", "--manifest"])
            .arg(project.join("drydock.toml"))
            .env("CUDA_PATH", &root)
            .env("CC", &cc)
            .env("CXX", &cc)
            .assert()
            .success()
            .stdout(predicate::str::contains("_demo.so"));
    }

    #[test]
    fn test_build_rejects_unknown_extension() {
        let tmp = TempDir::new().unwrap();

        let root = fake_toolkit(&tmp);
        fake_tool(&root.join("bin"), "nvcc");

        let bin = tmp.path().join("fakebin");
        fs::create_dir_all(&bin).unwrap();
        let cc = fake_tool(&bin, "cc");

        let project = fake_project(&tmp);
        fs::write(project.join("src/odd.xyz"), "?").unwrap();
        let manifest = fs::read_to_string(project.join("drydock.toml")).unwrap();
        fs::write(
            project.join("drydock.toml"),
            manifest.replace(r#""src/*.cu""#, r#""src/*.cu", "src/*.xyz""#),
        )
        .unwrap();

        drydock()
            .args(["build", "--manifest"])
            .arg(project.join("drydock.toml"))
            .env("CUDA_PATH", &root)
            .env("CC", &cc)
            .env("CXX", &cc)
            .assert()
            .failure()
            .stderr(predicate::str::contains(".xyz"));
    }
}
