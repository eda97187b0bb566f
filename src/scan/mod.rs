//! Python source scanning
//!
//! Walks a project tree, collects top-level imported module names, maps them to
//! distribution names, and finds files affected by known breaking changes.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanSettings;

/// Directory names never scanned (compared case-insensitively)
const SKIPPED_DIRS: &[&str] = &["venv", ".venv", "__pycache__", ".git"];

/// Import names whose distribution is published under a different name
pub const MODULE_ALIASES: &[(&str, &str)] = &[
    ("bs4", "beautifulsoup4"),
    ("sklearn", "scikit-learn"),
    ("PIL", "pillow"),
    ("yaml", "pyyaml"),
    ("Crypto", "pycryptodome"),
    ("cv2", "opencv-python"),
    ("tensorflow_gpu", "tensorflow"),
    ("torchvision", "torchvision"),
    ("IPython", "ipython"),
    ("jinja2", "Jinja2"),
];

/// Top-level standard library modules (CPython 3.8 – 3.12)
const STDLIB_MODULES: &[&str] = &[
    "__future__", "_thread", "abc", "aifc", "argparse", "array", "ast", "asynchat",
    "asyncio", "asyncore", "atexit", "audioop", "base64", "bdb", "binascii", "bisect",
    "builtins", "bz2", "calendar", "cgi", "cgitb", "chunk", "cmath", "cmd", "code",
    "codecs", "codeop", "collections", "colorsys", "compileall", "concurrent",
    "configparser", "contextlib", "contextvars", "copy", "copyreg", "cProfile", "crypt",
    "csv", "ctypes", "curses", "dataclasses", "datetime", "dbm", "decimal", "difflib",
    "dis", "doctest", "email", "encodings", "ensurepip", "enum", "errno", "faulthandler",
    "fcntl", "filecmp", "fileinput", "fnmatch", "fractions", "ftplib", "functools", "gc",
    "getopt", "getpass", "gettext", "glob", "graphlib", "grp", "gzip", "hashlib", "heapq",
    "hmac", "html", "http", "imaplib", "imghdr", "imp", "importlib", "inspect", "io",
    "ipaddress", "itertools", "json", "keyword", "lib2to3", "linecache", "locale",
    "logging", "lzma", "mailbox", "mailcap", "marshal", "math", "mimetypes", "mmap",
    "modulefinder", "msvcrt", "multiprocessing", "netrc", "nntplib", "numbers",
    "operator", "optparse", "os", "pathlib", "pdb", "pickle", "pickletools", "pipes",
    "pkgutil", "platform", "plistlib", "poplib", "posix", "pprint", "profile", "pstats",
    "pty", "pwd", "py_compile", "pyclbr", "pydoc", "queue", "quopri", "random", "re",
    "readline", "reprlib", "resource", "rlcompleter", "runpy", "sched", "secrets",
    "select", "selectors", "shelve", "shlex", "shutil", "signal", "site", "smtplib",
    "sndhdr", "socket", "socketserver", "sqlite3", "ssl", "stat", "statistics", "string",
    "stringprep", "struct", "subprocess", "sunau", "symtable", "sys", "sysconfig",
    "syslog", "tabnanny", "tarfile", "telnetlib", "tempfile", "termios", "textwrap",
    "threading", "time", "timeit", "tkinter", "token", "tokenize", "tomllib", "trace",
    "traceback", "tracemalloc", "tty", "turtle", "types", "typing", "unicodedata",
    "unittest", "urllib", "uu", "uuid", "venv", "warnings", "wave", "weakref",
    "webbrowser", "winreg", "winsound", "wsgiref", "xdrlib", "xml", "xmlrpc", "zipapp",
    "zipfile", "zipimport", "zlib", "zoneinfo",
];

static IMPORT_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^import\s+(.+)$").expect("valid import pattern"));

static FROM_IMPORT_STMT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^from\s+([A-Za-z_][\w.]*)\s+import\b").expect("valid from-import pattern"));

static DOTTED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*(?:\.\w+)*$").expect("valid module pattern"));

/// A known incompatible API change introduced by a package release
#[derive(Debug, Clone, Copy)]
pub struct BreakingChange {
    pub package: &'static str,
    pub summary: &'static str,
    /// Only files importing the package are considered
    import_markers: &'static [&'static str],
    pattern: &'static str,
}

pub const KNOWN_BREAKING_CHANGES: &[BreakingChange] = &[BreakingChange {
    package: "pandas",
    summary: "DataFrame.append removed",
    import_markers: &["import pandas", "from pandas"],
    pattern: r"\.append\s*\(",
}];

/// Known breaking change for a package, matched case-insensitively
pub fn breaking_change_for(package: &str) -> Option<&'static BreakingChange> {
    KNOWN_BREAKING_CHANGES
        .iter()
        .find(|change| change.package.eq_ignore_ascii_case(package))
}

/// Distribution name for an imported module
pub fn module_to_package<'a>(module: &'a str, overrides: &'a BTreeMap<String, String>) -> &'a str {
    if let Some(package) = overrides.get(module) {
        return package;
    }
    MODULE_ALIASES
        .iter()
        .find(|(m, _)| *m == module)
        .map(|(_, package)| *package)
        .unwrap_or(module)
}

pub fn is_stdlib_module(module: &str) -> bool {
    STDLIB_MODULES.contains(&module)
}

fn is_skipped_dir(entry: &DirEntry, extra: &[String]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    SKIPPED_DIRS.iter().any(|d| d.eq_ignore_ascii_case(name))
        || extra.iter().any(|d| d.eq_ignore_ascii_case(name))
}

/// All `*.py` files under `root`, skipping virtualenvs, caches and site-packages
pub fn list_python_files(root: &Path, settings: &ScanSettings) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e, &settings.exclude_dirs))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map(|ext| ext == "py").unwrap_or(false))
        .filter(|p| !p.to_string_lossy().replace('\\', "/").contains("site-packages"))
        .collect();

    files.sort();
    files
}

fn read_source(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!("Skipping unreadable {}: {}", path.display(), e);
            None
        }
    }
}

/// Top-level module names imported by one source text
///
/// Handles `import a.b, c as d` and `from a.b import x`; relative imports are ignored.
///
/// This is a line-based approximation, not a Python parser: import-looking lines
/// inside docstrings and triple-quoted strings are counted, and names continued
/// onto the next line with a backslash are missed.
pub fn imports_in_source(source: &str) -> BTreeSet<String> {
    let mut modules = BTreeSet::new();

    for line in source.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();

        for statement in line.split(';').map(str::trim) {
            if let Some(caps) = FROM_IMPORT_STMT.captures(statement) {
                if let Some(module) = caps.get(1) {
                    modules.insert(top_level(module.as_str()));
                }
            } else if let Some(caps) = IMPORT_STMT.captures(statement) {
                let Some(names) = caps.get(1) else {
                    continue;
                };
                for item in names.as_str().split(',') {
                    let name = item.split_whitespace().next().unwrap_or_default();
                    if DOTTED_NAME.is_match(name) {
                        modules.insert(top_level(name));
                    }
                }
            }
        }
    }

    modules
}

fn top_level(dotted: &str) -> String {
    dotted.split('.').next().unwrap_or(dotted).to_string()
}

/// Top-level module names importable from the project root
///
/// `<root>/foo.py` and `<root>/foo/...` provide `foo`; a `src/` layout also
/// provides the names directly under `src/`. Deeper names are not top-level.
fn local_modules(root: &Path, files: &[PathBuf]) -> HashSet<String> {
    let mut local = HashSet::new();
    for file in files {
        let Ok(relative) = file.strip_prefix(root) else {
            continue;
        };
        let names: Vec<&Path> = relative.iter().map(Path::new).collect();

        if let Some(name) = top_level_name(&names) {
            local.insert(name);
        }
        if names.first().is_some_and(|first| *first == Path::new("src")) {
            if let Some(name) = top_level_name(&names[1..]) {
                local.insert(name);
            }
        }
    }
    local
}

/// Module name of the first path component: a directory name or a file stem
fn top_level_name(components: &[&Path]) -> Option<String> {
    let first = components.first()?;
    let name = if components.len() == 1 {
        first.file_stem()?.to_str()?
    } else {
        first.to_str()?
    };
    (name != "__init__").then(|| name.to_string())
}

/// Third-party top-level modules imported anywhere under `root`, sorted
pub fn scan_imports(root: &Path, settings: &ScanSettings) -> Vec<String> {
    let files = list_python_files(root, settings);
    let local = local_modules(root, &files);

    let mut modules = BTreeSet::new();
    for file in &files {
        if let Some(source) = read_source(file) {
            let found = imports_in_source(&source);
            trace!("{}: {:?}", file.display(), found);
            modules.extend(found);
        }
    }

    debug!("Scanned {} files, {} distinct imports", files.len(), modules.len());

    modules
        .into_iter()
        .filter(|m| !local.contains(m))
        .filter(|m| settings.include_stdlib || !is_stdlib_module(m))
        .collect()
}

/// Distribution names for the third-party imports under `root`, in module order
///
/// Two modules mapping to the same distribution yield one entry.
pub fn detect_packages(root: &Path, settings: &ScanSettings) -> Vec<String> {
    let mut seen = BTreeSet::new();
    scan_imports(root, settings)
        .iter()
        .map(|module| module_to_package(module, &settings.aliases).to_string())
        .filter(|package| seen.insert(package.clone()))
        .collect()
}

/// Files under `root` affected by a breaking change
pub fn find_impacted_files(root: &Path, change: &BreakingChange, settings: &ScanSettings) -> Vec<PathBuf> {
    let Ok(pattern) = Regex::new(change.pattern) else {
        return Vec::new();
    };

    list_python_files(root, settings)
        .into_iter()
        .filter(|file| {
            let Some(source) = read_source(file) else {
                return false;
            };
            change.import_markers.iter().any(|m| source.contains(m)) && pattern.is_match(&source)
        })
        .collect()
}
