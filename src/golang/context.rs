//! Target platform and the build tags it satisfies.

use log::debug;

use crate::runtime::Runtime;

/// Go 1.x release assumed when the toolchain does not report its version.
const DEFAULT_GO_MINOR: u32 = 24;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix",
    "android",
    "darwin",
    "dragonfly",
    "freebsd",
    "hurd",
    "illumos",
    "ios",
    "linux",
    "netbsd",
    "openbsd",
    "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386",
    "amd64",
    "amd64p32",
    "arm",
    "armbe",
    "arm64",
    "arm64be",
    "loong64",
    "mips",
    "mipsle",
    "mips64",
    "mips64le",
    "mips64p32",
    "mips64p32le",
    "ppc",
    "ppc64",
    "ppc64le",
    "riscv",
    "riscv64",
    "s390",
    "s390x",
    "sparc",
    "sparc64",
    "wasm",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    pub cgo_enabled: bool,
    /// Extra tags given with `-tags`.
    pub build_tags: Vec<String>,
    /// Tags `go1.1` through `go1.<release_minor>` are satisfied.
    pub release_minor: u32,
}

impl BuildContext {
    pub fn new(goos: &str, goarch: &str, cgo_enabled: bool, build_tags: Vec<String>) -> Self {
        Self {
            goos: goos.to_string(),
            goarch: goarch.to_string(),
            cgo_enabled,
            build_tags,
            release_minor: DEFAULT_GO_MINOR,
        }
    }

    pub fn with_release(mut self, minor: u32) -> Self {
        self.release_minor = minor;
        self
    }

    /// Context of the machine we are running on.
    pub fn host() -> Self {
        Self::new(host_os(), host_arch(), true, Vec::new())
    }

    /// Host context overridden by `GOOS`, `GOARCH` and `CGO_ENABLED`.
    pub fn from_env<R: Runtime>(runtime: &R, build_tags: Vec<String>) -> Self {
        let host = Self::host();
        let goos = runtime
            .env_var("GOOS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(host.goos);
        let goarch = runtime
            .env_var("GOARCH")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(host.goarch);
        let cgo_enabled = runtime.env_var("CGO_ENABLED").map_or(true, |v| v != "0");

        Self {
            goos,
            goarch,
            cgo_enabled,
            build_tags,
            release_minor: host.release_minor,
        }
    }

    /// Whether build tag `tag` is satisfied.
    pub fn matches_tag(&self, tag: &str) -> bool {
        if tag.is_empty() {
            return false;
        }
        if tag == "cgo" {
            return self.cgo_enabled;
        }
        if tag == self.goos || tag == self.goarch || tag == "gc" {
            return true;
        }
        match (self.goos.as_str(), tag) {
            ("android", "linux") | ("illumos", "solaris") | ("ios", "darwin") => return true,
            (goos, "unix") => return UNIX_OS.contains(&goos),
            _ => {}
        }
        if let Some(minor) = tag.strip_prefix("go1.") {
            return minor
                .parse::<u32>()
                .is_ok_and(|minor| (1..=self.release_minor).contains(&minor));
        }
        self.build_tags.iter().any(|t| t == tag)
    }

    /// Apply `*_GOOS`, `*_GOARCH` and `*_GOOS_GOARCH` file name constraints.
    pub fn good_os_arch_file(&self, file_name: &str) -> bool {
        let stem = file_name.split('.').next().unwrap_or(file_name);
        let Some(first) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[first..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }

        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        if n >= 1 && (KNOWN_OS.contains(&parts[n - 1]) || KNOWN_ARCH.contains(&parts[n - 1])) {
            return self.matches_tag(parts[n - 1]);
        }
        true
    }
}

/// Minor release of the Go toolchain `go`, from `go env GOVERSION`.
///
/// Returns `None` when the toolchain cannot be asked or reports a
/// development build without a release number.
#[tracing::instrument(skip(runtime))]
pub fn toolchain_release<R: Runtime>(runtime: &R, go: &str) -> Option<u32> {
    let output = match runtime.run_command(go, &["env".to_string(), "GOVERSION".to_string()]) {
        Ok(output) => output,
        Err(e) => {
            debug!("Could not ask {} for its version: {:#}", go, e);
            return None;
        }
    };
    let minor = parse_release(output.trim());
    if minor.is_none() {
        debug!("Unrecognized Go version {:?}", output.trim());
    }
    minor
}

/// Minor number of a version such as `go1.22.3`, `go1.25rc1` or
/// `devel go1.26-abcdef`.
fn parse_release(version: &str) -> Option<u32> {
    let start = version.find("go1.")? + "go1.".len();
    let digits: String = version[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "loongarch64" => "loong64",
        "powerpc" => "ppc",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        "wasm32" => "wasm",
        other => other,
    }
}
