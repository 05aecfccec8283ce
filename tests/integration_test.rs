use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A stand-in for the Go toolchain that answers `go list std`.
#[cfg(unix)]
fn fake_go(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("go");
    fs::write(
        &path,
        "#!/bin/sh\n\
         if [ \"$1 $2\" = \"list std\" ]; then\n\
         printf 'fmt\\nos\\nstrings\\ntesting\\nnet/http\\n'\n\
         exit 0\n\
         fi\n\
         echo \"unexpected: $*\" >&2\n\
         exit 2\n",
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn pkgsrc_tree() -> TempDir {
    let pkgsrc = tempdir().unwrap();
    write(
        pkgsrc.path(),
        "www/go-net/Makefile",
        "DISTNAME=\tnet-0.0.20200301\n\
         GO_SRCPATH=\tgolang.org/x/net\n\
         .include \"../../lang/go/go-package.mk\"\n\
         .include \"../../mk/bsd.pkg.mk\"\n",
    );
    write(
        pkgsrc.path(),
        "devel/go-testify/Makefile",
        "GH_ACCOUNT=\tstretchr\nGO_SRCPATH=\tgithub.com/${GH_ACCOUNT}/testify\n",
    );
    write(
        pkgsrc.path(),
        "devel/go-app/Makefile",
        "GO_SRCPATH=\tgithub.com/example/app\n",
    );
    write(pkgsrc.path(), "devel/gmake/Makefile", "DISTNAME=\tmake-4.3\n");
    pkgsrc
}

fn gopath_tree() -> TempDir {
    let gopath = tempdir().unwrap();
    let app = "src/github.com/example/app";
    write(
        gopath.path(),
        &format!("{app}/app.go"),
        "package app\n\nimport (\n\t\"fmt\"\n\t\"golang.org/x/net/html\"\n\t\"github.com/example/app/internal\"\n)\n",
    );
    write(
        gopath.path(),
        &format!("{app}/app_test.go"),
        "package app\n\nimport (\n\t\"testing\"\n\t\"golang.org/x/net/html/atom\"\n\t\"github.com/stretchr/testify/assert\"\n)\n",
    );
    write(
        gopath.path(),
        &format!("{app}/internal/internal.go"),
        "package internal\n\nimport \"github.com/unknown/lib\"\n",
    );
    write(
        gopath.path(),
        &format!("{app}/testdata/fixture.go"),
        "package fixture\n\nimport \"github.com/fixture/dep\"\n",
    );
    write(
        gopath.path(),
        "src/github.com/new/tool/tool.go",
        "package tool\n\nimport \"golang.org/x/net/html\"\n",
    );
    gopath
}

fn gosrc2pkg(pkgsrc: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("gosrc2pkg"));
    cmd.env_remove("PKGSRCDIR")
        .env_remove("PKGSRC")
        .env_remove("GOPATH")
        .env_remove("GO")
        .env_remove("RUST_LOG")
        .env("GOOS", "linux")
        .env("GOARCH", "amd64")
        .arg("--pkgsrc")
        .arg(pkgsrc.path());
    cmd
}

#[test]
fn test_index_dump() {
    let pkgsrc = pkgsrc_tree();

    gosrc2pkg(&pkgsrc)
        .arg("index")
        .assert()
        .success()
        .stdout(
            "github.com/example/app\tdevel/go-app\n\
             github.com/stretchr/testify\tdevel/go-testify\n\
             golang.org/x/net\twww/go-net\n",
        );
}

#[test]
fn test_index_dump_json() {
    let pkgsrc = pkgsrc_tree();

    let output = gosrc2pkg(&pkgsrc)
        .arg("index")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["golang.org/x/net"], "www/go-net");
    assert_eq!(value.as_object().unwrap().len(), 3);
}

#[test]
fn test_missing_pkgsrc_dir_fails() {
    let pkgsrc = tempdir().unwrap();
    let missing = pkgsrc.path().join("missing");

    let mut cmd = Command::new(cargo::cargo_bin!("gosrc2pkg"));
    cmd.env_remove("PKGSRCDIR")
        .arg("--pkgsrc")
        .arg(&missing)
        .arg("index")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pkgsrc"));
}

#[cfg(unix)]
#[test]
fn test_depends_report() {
    let pkgsrc = pkgsrc_tree();
    let gopath = gopath_tree();
    let bin = tempdir().unwrap();
    let go = fake_go(bin.path());

    gosrc2pkg(&pkgsrc)
        .arg("--gopath")
        .arg(gopath.path())
        .arg("--go")
        .arg(&go)
        .arg("depends")
        .arg("--force")
        .arg("github.com/example/app")
        .assert()
        .success()
        .stdout(
            "Depends of github.com/example/app:\n\
             www/go-net\n\
             github.com/unknown/lib (UNRESOLVED)\n\
             Extra Test Depends:\n\
             devel/go-testify\n",
        );
}

#[cfg(unix)]
#[test]
fn test_depends_skips_registered_without_force() {
    let pkgsrc = pkgsrc_tree();
    let gopath = gopath_tree();
    let bin = tempdir().unwrap();
    let go = fake_go(bin.path());

    gosrc2pkg(&pkgsrc)
        .arg("--gopath")
        .arg(gopath.path())
        .arg("--go")
        .arg(&go)
        .arg("depends")
        .arg("github.com/example/app")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("already part of a pkgsrc package"));
}

#[cfg(unix)]
#[test]
fn test_depends_unregistered_target() {
    let pkgsrc = pkgsrc_tree();
    let gopath = gopath_tree();
    let bin = tempdir().unwrap();
    let go = fake_go(bin.path());

    gosrc2pkg(&pkgsrc)
        .arg("--gopath")
        .arg(gopath.path())
        .arg("--go")
        .arg(&go)
        .arg("depends")
        .arg("github.com/new/tool")
        .assert()
        .success()
        .stdout(
            "golang.org/x/net/html (UNRESOLVED)\n\
             Depends of github.com/new/tool:\n\
             Extra Test Depends:\n",
        );
}

#[cfg(unix)]
#[test]
fn test_depends_toolchain_failure_is_fatal() {
    let pkgsrc = pkgsrc_tree();
    let gopath = gopath_tree();

    gosrc2pkg(&pkgsrc)
        .arg("--gopath")
        .arg(gopath.path())
        .arg("--go")
        .arg("false")
        .arg("depends")
        .arg("github.com/example/app")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Go standard library"));
}

#[cfg(unix)]
#[test]
fn test_depends_missing_source_fails() {
    let pkgsrc = pkgsrc_tree();
    let gopath = gopath_tree();
    let bin = tempdir().unwrap();
    let go = fake_go(bin.path());

    gosrc2pkg(&pkgsrc)
        .arg("--gopath")
        .arg(gopath.path())
        .arg("--go")
        .arg(&go)
        .arg("depends")
        .arg("github.com/not/downloaded")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
