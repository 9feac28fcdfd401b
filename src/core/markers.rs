//! Environment markers and their live values.
//!
//! A requirement such as `requires('sys_platform', 'linux')` names a marker
//! and the value the running environment must report for it. Only the
//! markers in [`Marker::ALL`] are checked.
//!
//! Values come from two places:
//! - the host this binary was built for (`os_name`, `sys_platform`,
//!   `platform_system`, `platform_machine`)
//! - a Python interpreter, asked once via a small probe script; its answers
//!   take precedence over host-derived ones

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::util::process::ProcessBuilder;

/// A recognized environment marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Marker {
    OsName,
    SysPlatform,
    PlatformMachine,
    PlatformPythonImplementation,
    PlatformRelease,
    PlatformSystem,
    PlatformVersion,
    /// `major.minor` only
    PythonVersion,
    PythonFullVersion,
    ImplementationName,
    ImplementationVersion,
}

impl Marker {
    pub const ALL: [Marker; 11] = [
        Marker::OsName,
        Marker::SysPlatform,
        Marker::PlatformMachine,
        Marker::PlatformPythonImplementation,
        Marker::PlatformRelease,
        Marker::PlatformSystem,
        Marker::PlatformVersion,
        Marker::PythonVersion,
        Marker::PythonFullVersion,
        Marker::ImplementationName,
        Marker::ImplementationVersion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::OsName => "os_name",
            Marker::SysPlatform => "sys_platform",
            Marker::PlatformMachine => "platform_machine",
            Marker::PlatformPythonImplementation => "platform_python_implementation",
            Marker::PlatformRelease => "platform_release",
            Marker::PlatformSystem => "platform_system",
            Marker::PlatformVersion => "platform_version",
            Marker::PythonVersion => "python_version",
            Marker::PythonFullVersion => "python_full_version",
            Marker::ImplementationName => "implementation_name",
            Marker::ImplementationVersion => "implementation_version",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Marker {
    type Err = UnknownMarker;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Marker::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMarker(s.to_string()))
    }
}

/// A marker name outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment marker '{0}'")]
pub struct UnknownMarker(pub String);

/// Live marker values for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerEnvironment {
    values: BTreeMap<Marker, String>,
}

impl MarkerEnvironment {
    /// An environment with no known values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Values derivable from the host platform alone.
    pub fn host() -> Self {
        let os = std::env::consts::OS;
        let arch = std::env::consts::ARCH;

        let mut env = MarkerEnvironment::new();
        env.set(Marker::OsName, host_os_name(os));
        env.set(Marker::SysPlatform, host_sys_platform(os));
        env.set(Marker::PlatformSystem, host_platform_system(os));
        env.set(Marker::PlatformMachine, host_platform_machine(os, arch));
        env
    }

    /// Ask `interpreter` for every marker it can report.
    pub fn probe(interpreter: &Path) -> Result<Self> {
        let output = ProcessBuilder::new(interpreter)
            .arg("-c")
            .arg(PROBE_SCRIPT)
            .env("PYTHONIOENCODING", "utf-8")
            .exec_and_check()
            .with_context(|| format!("failed to probe interpreter {}", interpreter.display()))?;

        let probe: InterpreterProbe = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("unexpected probe output from {}", interpreter.display()))?;

        tracing::debug!(
            "probed {} ({} {})",
            interpreter.display(),
            probe.implementation_name,
            probe.python_full_version
        );
        Ok(probe.into_environment())
    }

    /// Host values, overlaid with the interpreter's answers when available.
    ///
    /// A failed probe is logged and leaves only the host values.
    pub fn detect(interpreter: Option<&Path>) -> Self {
        let mut env = Self::host();
        match interpreter {
            Some(python) => match Self::probe(python) {
                Ok(probed) => env.merge(probed),
                Err(e) => tracing::warn!("{:#}", e),
            },
            None => tracing::warn!("no Python interpreter found; interpreter markers unavailable"),
        }
        env
    }

    /// Build an environment from explicit marker/value pairs.
    pub fn from_pairs<V: Into<String>>(pairs: impl IntoIterator<Item = (Marker, V)>) -> Self {
        let mut env = MarkerEnvironment::new();
        for (marker, value) in pairs {
            env.set(marker, value);
        }
        env
    }

    pub fn set(&mut self, marker: Marker, value: impl Into<String>) {
        self.values.insert(marker, value.into());
    }

    pub fn get(&self, marker: Marker) -> Option<&str> {
        self.values.get(&marker).map(String::as_str)
    }

    /// Take every value from `other`, replacing existing ones.
    pub fn merge(&mut self, other: MarkerEnvironment) {
        self.values.extend(other.values);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Marker, &str)> {
        self.values.iter().map(|(m, v)| (*m, v.as_str()))
    }
}

/// `major.minor.micro`, plus release level and serial unless final.
///
/// `(3, 9, 0, "beta", 2)` formats as `3.9.0b2`.
pub fn format_full_version(info: &VersionInfo) -> String {
    let (major, minor, micro, ref level, serial) = *info;
    let mut version = format!("{}.{}.{}", major, minor, micro);
    if level != "final" {
        if let Some(code) = level.chars().next() {
            version.push(code);
        }
        version.push_str(&serial.to_string());
    }
    version
}

/// `(major, minor, micro, releaselevel, serial)` as reported by Python.
pub type VersionInfo = (u64, u64, u64, String, u64);

const PROBE_SCRIPT: &str = r#"
import json, os, platform, sys
impl = getattr(sys, 'implementation', None)
print(json.dumps({
    'os_name': os.name,
    'sys_platform': sys.platform,
    'platform_machine': platform.machine(),
    'platform_python_implementation': platform.python_implementation(),
    'platform_release': platform.release(),
    'platform_system': platform.system(),
    'platform_version': platform.version(),
    'python_full_version': platform.python_version(),
    'version_info': list(sys.version_info),
    'implementation_name': impl.name if impl else 'cpython',
    'implementation_version': list(impl.version) if impl else None,
}))
"#;

#[derive(Debug, Deserialize)]
struct InterpreterProbe {
    os_name: String,
    sys_platform: String,
    platform_machine: String,
    platform_python_implementation: String,
    platform_release: String,
    platform_system: String,
    platform_version: String,
    python_full_version: String,
    version_info: VersionInfo,
    implementation_name: String,
    implementation_version: Option<VersionInfo>,
}

impl InterpreterProbe {
    fn into_environment(self) -> MarkerEnvironment {
        let python_version = format!("{}.{}", self.version_info.0, self.version_info.1);
        let implementation_version = self
            .implementation_version
            .as_ref()
            .map(format_full_version)
            .unwrap_or_else(|| "0".to_string());

        MarkerEnvironment::from_pairs([
            (Marker::OsName, self.os_name),
            (Marker::SysPlatform, self.sys_platform),
            (Marker::PlatformMachine, self.platform_machine),
            (
                Marker::PlatformPythonImplementation,
                self.platform_python_implementation,
            ),
            (Marker::PlatformRelease, self.platform_release),
            (Marker::PlatformSystem, self.platform_system),
            (Marker::PlatformVersion, self.platform_version),
            (Marker::PythonVersion, python_version),
            (Marker::PythonFullVersion, self.python_full_version),
            (Marker::ImplementationName, self.implementation_name),
            (Marker::ImplementationVersion, implementation_version),
        ])
    }
}

fn host_os_name(os: &str) -> &'static str {
    if os == "windows" {
        "nt"
    } else {
        "posix"
    }
}

fn host_sys_platform(os: &str) -> String {
    match os {
        "macos" | "ios" => "darwin".to_string(),
        "windows" => "win32".to_string(),
        other => other.to_string(),
    }
}

fn host_platform_system(os: &str) -> String {
    match os {
        "linux" | "android" => "Linux".to_string(),
        "macos" | "ios" => "Darwin".to_string(),
        "windows" => "Windows".to_string(),
        "freebsd" => "FreeBSD".to_string(),
        "netbsd" => "NetBSD".to_string(),
        "openbsd" => "OpenBSD".to_string(),
        other => other.to_string(),
    }
}

fn host_platform_machine(os: &str, arch: &str) -> String {
    match (os, arch) {
        ("windows", "x86_64") => "AMD64".to_string(),
        ("windows", "aarch64") => "ARM64".to_string(),
        ("macos", "aarch64") => "arm64".to_string(),
        ("freebsd", "x86_64") => "amd64".to_string(),
        (_, arch) => arch.to_string(),
    }
}
