//! Python standard library module names.
//!
//! Packages installed from PyPI must not shadow these, otherwise Home
//! Assistant imports the package instead of the standard library module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
}

impl PythonVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for PythonVersion {
    fn default() -> Self {
        Self::new(3, 8)
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PythonVersion {
    type Err = ValidatorError;

    /// Accepts `3`, `3.11` and `3.11.4`; the patch level is ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidatorError::Config {
            message: format!("invalid Python version '{}'", s),
        };
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };
        if major != 3 {
            return Err(invalid());
        }
        Ok(Self::new(major, minor))
    }
}

/// Modules present in every supported Python 3 release
const COMMON: &[&str] = &[
    "__future__", "_thread", "abc", "argparse", "array", "ast", "asyncio", "atexit",
    "base64", "bdb", "binascii", "bisect", "builtins", "bz2", "calendar", "cmath",
    "cmd", "code", "codecs", "codeop", "collections", "colorsys", "compileall",
    "concurrent", "configparser", "contextlib", "contextvars", "copy", "copyreg",
    "cProfile", "csv", "ctypes", "curses", "dataclasses", "datetime", "dbm",
    "decimal", "difflib", "dis", "doctest", "email", "encodings", "ensurepip",
    "enum", "errno", "faulthandler", "fcntl", "filecmp", "fileinput", "fnmatch",
    "fractions", "ftplib", "functools", "gc", "getopt", "getpass", "gettext",
    "glob", "grp", "gzip", "hashlib", "heapq", "hmac", "html", "http", "idlelib",
    "imaplib", "importlib", "inspect", "io", "ipaddress", "itertools", "json",
    "keyword", "linecache", "locale", "logging", "lzma", "mailbox", "marshal",
    "math", "mimetypes", "mmap", "modulefinder", "msvcrt", "multiprocessing",
    "netrc", "numbers", "operator", "optparse", "os", "pathlib", "pdb", "pickle",
    "pickletools", "pkgutil", "platform", "plistlib", "poplib", "posix", "pprint",
    "profile", "pstats", "pty", "pwd", "py_compile", "pyclbr", "pydoc", "queue",
    "quopri", "random", "re", "readline", "reprlib", "resource", "rlcompleter",
    "runpy", "sched", "secrets", "select", "selectors", "shelve", "shlex",
    "shutil", "signal", "site", "smtplib", "socket", "socketserver", "sqlite3",
    "ssl", "stat", "statistics", "string", "stringprep", "struct", "subprocess",
    "symtable", "sys", "sysconfig", "syslog", "tabnanny", "tarfile", "tempfile",
    "termios", "textwrap", "threading", "time", "timeit", "tkinter", "token",
    "tokenize", "trace", "traceback", "tracemalloc", "tty", "turtle", "turtledemo",
    "types", "typing", "unicodedata", "unittest", "urllib", "uuid", "venv",
    "warnings", "wave", "weakref", "webbrowser", "winreg", "winsound", "wsgiref",
    "xml", "xmlrpc", "zipapp", "zipfile", "zipimport", "zlib",
];

/// `(module, first release that ships it)`
const ADDED: &[(&str, PythonVersion)] = &[
    ("graphlib", PythonVersion::new(3, 9)),
    ("zoneinfo", PythonVersion::new(3, 9)),
    ("tomllib", PythonVersion::new(3, 11)),
];

/// `(module, first release that no longer ships it)`
const REMOVED: &[(&str, PythonVersion)] = &[
    ("formatter", PythonVersion::new(3, 10)),
    ("parser", PythonVersion::new(3, 10)),
    ("symbol", PythonVersion::new(3, 10)),
    ("binhex", PythonVersion::new(3, 11)),
    ("asynchat", PythonVersion::new(3, 12)),
    ("asyncore", PythonVersion::new(3, 12)),
    ("distutils", PythonVersion::new(3, 12)),
    ("imp", PythonVersion::new(3, 12)),
    ("smtpd", PythonVersion::new(3, 12)),
    ("aifc", PythonVersion::new(3, 13)),
    ("audioop", PythonVersion::new(3, 13)),
    ("cgi", PythonVersion::new(3, 13)),
    ("cgitb", PythonVersion::new(3, 13)),
    ("chunk", PythonVersion::new(3, 13)),
    ("crypt", PythonVersion::new(3, 13)),
    ("imghdr", PythonVersion::new(3, 13)),
    ("lib2to3", PythonVersion::new(3, 13)),
    ("mailcap", PythonVersion::new(3, 13)),
    ("msilib", PythonVersion::new(3, 13)),
    ("nis", PythonVersion::new(3, 13)),
    ("nntplib", PythonVersion::new(3, 13)),
    ("ossaudiodev", PythonVersion::new(3, 13)),
    ("pipes", PythonVersion::new(3, 13)),
    ("sndhdr", PythonVersion::new(3, 13)),
    ("spwd", PythonVersion::new(3, 13)),
    ("sunau", PythonVersion::new(3, 13)),
    ("telnetlib", PythonVersion::new(3, 13)),
    ("uu", PythonVersion::new(3, 13)),
    ("xdrlib", PythonVersion::new(3, 13)),
];

/// Top-level standard library modules shipped with `version`
pub fn stdlib_modules(version: PythonVersion) -> Vec<&'static str> {
    let mut modules: Vec<&'static str> = COMMON.to_vec();
    modules.extend(
        ADDED
            .iter()
            .filter(|(_, since)| version >= *since)
            .map(|(name, _)| *name),
    );
    modules.extend(
        REMOVED
            .iter()
            .filter(|(_, gone)| version < *gone)
            .map(|(name, _)| *name),
    );
    modules.sort_unstable();
    modules
}

/// Whether a distribution name collides with a standard library module.
/// Comparison ignores case and treats `-`, `_` and `.` alike.
pub fn shadows_stdlib(package: &str, version: PythonVersion) -> bool {
    let wanted = normalize(package);
    stdlib_modules(version)
        .iter()
        .any(|module| normalize(module) == wanted)
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase().replace(['-', '.'], "_")
}
