//! Static table of external formatters, linters and type checkers per language.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Token replaced by the file path in [`FileArgMode::Placeholder`] arguments
pub const FILE_PLACEHOLDER: &str = "{file}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    Java,
    Kotlin,
    Swift,
    CSharp,
    Cpp,
    Ruby,
    Php,
    Elixir,
    Scala,
    R,
    Dart,
    Lua,
}

impl Language {
    pub const ALL: [Language; 17] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Go,
        Language::Rust,
        Language::Java,
        Language::Kotlin,
        Language::Swift,
        Language::CSharp,
        Language::Cpp,
        Language::Ruby,
        Language::Php,
        Language::Elixir,
        Language::Scala,
        Language::R,
        Language::Dart,
        Language::Lua,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::CSharp => "csharp",
            Language::Cpp => "cpp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Elixir => "elixir",
            Language::Scala => "scala",
            Language::R => "r",
            Language::Dart => "dart",
            Language::Lua => "lua",
        }
    }

    /// Lowercase extensions, without the dot
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Java => &["java"],
            Language::Kotlin => &["kt", "kts"],
            Language::Swift => &["swift"],
            Language::CSharp => &["cs"],
            Language::Cpp => &["c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx"],
            Language::Ruby => &["rb", "rake"],
            Language::Php => &["php"],
            Language::Elixir => &["ex", "exs"],
            Language::Scala => &["scala", "sc"],
            Language::R => &["r"],
            Language::Dart => &["dart"],
            Language::Lua => &["lua"],
        }
    }

    /// Language for a file, by extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str() == key)
            .ok_or_else(|| anyhow!("unknown language '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolType {
    Formatter,
    Linter,
    TypeChecker,
}

impl ToolType {
    pub const ALL: [ToolType; 3] = [ToolType::Formatter, ToolType::Linter, ToolType::TypeChecker];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Formatter => "formatter",
            ToolType::Linter => "linter",
            ToolType::TypeChecker => "type-checker",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the file path goes in the argument list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileArgMode {
    /// `command args... file`
    #[default]
    Append,
    /// `command file args...`
    Prepend,
    /// `{file}` inside one of the args is replaced (inline scripts)
    Placeholder,
}

/// How to invoke one external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub file_arg: FileArgMode,
    /// Restricts the tool to these extensions; empty means every extension of the language
    #[serde(default)]
    pub extensions: Vec<String>,
    pub tool_type: ToolType,
    /// Lower is preferred
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolDescriptor {
    fn new(
        name: &str,
        command: &str,
        args: &[&str],
        tool_type: ToolType,
        priority: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            file_arg: FileArgMode::Append,
            extensions: Vec::new(),
            tool_type,
            priority,
            timeout_secs: None,
        }
    }

    fn file_arg(mut self, mode: FileArgMode) -> Self {
        self.file_arg = mode;
        self
    }

    fn only(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Whether the descriptor's extension filter admits this path
    pub fn applies_to(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

fn fmt_tool(name: &str, command: &str, args: &[&str], priority: u32) -> ToolDescriptor {
    ToolDescriptor::new(name, command, args, ToolType::Formatter, priority)
}

fn lint_tool(name: &str, command: &str, args: &[&str], priority: u32) -> ToolDescriptor {
    ToolDescriptor::new(name, command, args, ToolType::Linter, priority)
}

fn type_tool(name: &str, command: &str, args: &[&str], priority: u32) -> ToolDescriptor {
    ToolDescriptor::new(name, command, args, ToolType::TypeChecker, priority).timeout(60)
}

fn js_family() -> Vec<ToolDescriptor> {
    vec![
        fmt_tool("biome", "biome", &["format", "--write"], 1),
        fmt_tool("prettier", "prettier", &["--write"], 2),
        lint_tool("eslint", "eslint", &["--fix"], 1),
        lint_tool("biome-lint", "biome", &["lint", "--write"], 2),
    ]
}

/// The builtin language table, keyed by language name
pub fn builtin_table() -> BTreeMap<String, Vec<ToolDescriptor>> {
    use FileArgMode::{Placeholder, Prepend};

    let mut table = BTreeMap::new();
    let mut add = |lang: Language, tools: Vec<ToolDescriptor>| {
        table.insert(lang.as_str().to_string(), tools);
    };

    add(
        Language::Python,
        vec![
            fmt_tool("ruff-format", "ruff", &["format"], 1),
            fmt_tool("black", "black", &["--quiet"], 2),
            fmt_tool("isort", "isort", &["--quiet"], 3),
            lint_tool("ruff", "ruff", &["check", "--fix"], 1),
            lint_tool("pylint", "pylint", &["--output-format=parseable"], 2),
            lint_tool("flake8", "flake8", &[], 3),
            type_tool("mypy", "mypy", &["--no-error-summary"], 1),
            type_tool("pyright", "pyright", &[], 2),
        ],
    );

    add(Language::JavaScript, js_family());

    let mut ts = js_family();
    ts.push(type_tool("tsc", "tsc", &["--noEmit"], 1));
    add(Language::TypeScript, ts);

    add(
        Language::Go,
        vec![
            fmt_tool("gofumpt", "gofumpt", &["-w"], 1),
            fmt_tool("gofmt", "gofmt", &["-w"], 2),
            fmt_tool("goimports", "goimports", &["-w"], 3),
            lint_tool("golangci-lint", "golangci-lint", &["run"], 1),
            lint_tool("go-vet", "go", &["vet"], 2),
        ],
    );

    add(
        Language::Rust,
        vec![fmt_tool("rustfmt", "rustfmt", &["--edition", "2021"], 1)],
    );

    add(
        Language::Java,
        vec![
            fmt_tool("google-java-format", "google-java-format", &["--replace"], 1),
            lint_tool("checkstyle", "checkstyle", &["-c", "/google_checks.xml"], 1),
        ],
    );

    add(
        Language::Kotlin,
        vec![
            fmt_tool("ktlint-format", "ktlint", &["--format"], 1),
            fmt_tool("ktfmt", "ktfmt", &[], 2),
            lint_tool("ktlint", "ktlint", &[], 1),
            lint_tool("detekt", "detekt", &["--input"], 2),
        ],
    );

    add(
        Language::Swift,
        vec![
            fmt_tool("swiftformat", "swiftformat", &["--quiet"], 1).file_arg(Prepend),
            fmt_tool("swift-format", "swift-format", &["format", "--in-place"], 2),
            lint_tool("swiftlint", "swiftlint", &["lint", "--quiet"], 1),
        ],
    );

    add(
        Language::CSharp,
        vec![
            fmt_tool("csharpier", "csharpier", &["format"], 1),
            lint_tool("dotnet-format", "dotnet", &["format", "--verify-no-changes", "--include"], 1),
        ],
    );

    add(
        Language::Cpp,
        vec![
            fmt_tool("clang-format", "clang-format", &["-i"], 1),
            lint_tool("clang-tidy", "clang-tidy", &["--quiet"], 1),
            lint_tool("cppcheck", "cppcheck", &["--quiet", "--enable=warning"], 2),
        ],
    );

    add(
        Language::Ruby,
        vec![
            fmt_tool("rufo", "rufo", &[], 1),
            fmt_tool("rubocop-layout", "rubocop", &["-x"], 2),
            lint_tool("rubocop", "rubocop", &["-a", "--format", "emacs"], 1),
        ],
    );

    add(
        Language::Php,
        vec![
            fmt_tool("php-cs-fixer", "php-cs-fixer", &["fix", "--quiet"], 1),
            fmt_tool("phpcbf", "phpcbf", &[], 2),
            lint_tool("phpstan", "phpstan", &["analyse", "--no-progress", "--error-format=raw"], 1),
            lint_tool("phpcs", "phpcs", &["--report=emacs"], 2),
        ],
    );

    add(
        Language::Elixir,
        vec![
            fmt_tool("mix-format", "mix", &["format"], 1),
            lint_tool("credo", "mix", &["credo", "--format", "flycheck"], 1),
        ],
    );

    add(
        Language::Scala,
        vec![
            fmt_tool("scalafmt", "scalafmt", &["--quiet"], 1),
            lint_tool("scalafix", "scalafix", &[], 1),
        ],
    );

    add(
        Language::R,
        vec![
            fmt_tool("styler", "Rscript", &["-e", "styler::style_file('{file}')"], 1)
                .file_arg(Placeholder),
            lint_tool("lintr", "Rscript", &["-e", "lintr::lint('{file}')"], 1)
                .file_arg(Placeholder),
        ],
    );

    add(
        Language::Dart,
        vec![
            fmt_tool("dart-format", "dart", &["format"], 1),
            lint_tool("dart-analyze", "dart", &["analyze"], 1),
        ],
    );

    add(
        Language::Lua,
        vec![
            fmt_tool("stylua", "stylua", &[], 1),
            lint_tool("luacheck", "luacheck", &["--formatter", "plain"], 1),
            lint_tool("selene", "selene", &[], 2),
        ],
    );

    // Headers are shared between C and C++; clang-tidy needs a translation unit
    if let Some(cpp) = table.get_mut(Language::Cpp.as_str()) {
        for tool in cpp.iter_mut().filter(|t| t.name == "clang-tidy") {
            *tool = tool.clone().only(&["c", "cc", "cpp", "cxx"]);
        }
    }

    table
}

/// Answers whether an executable is installed
pub trait ToolLocator: Send + Sync {
    fn is_installed(&self, command: &str) -> bool;
}

/// Searches `PATH`
pub struct PathLocator;

impl ToolLocator for PathLocator {
    fn is_installed(&self, command: &str) -> bool {
        which::which(command).is_ok()
    }
}

/// Language → tools lookup with memoised availability.
pub struct ToolCatalog {
    tools: HashMap<Language, Vec<ToolDescriptor>>,
    locator: Arc<dyn ToolLocator>,
    /// tool name -> installed, for the process lifetime
    availability: RwLock<HashMap<String, bool>>,
}

impl ToolCatalog {
    /// Build from a string-keyed table. Unknown language keys are rejected.
    pub fn from_table(
        table: BTreeMap<String, Vec<ToolDescriptor>>,
        locator: Arc<dyn ToolLocator>,
    ) -> Result<Self> {
        let mut tools: HashMap<Language, Vec<ToolDescriptor>> = HashMap::new();
        for (key, descriptors) in table {
            let lang: Language = key
                .parse()
                .with_context(|| format!("Invalid tool table key '{}'", key))?;
            tools.entry(lang).or_default().extend(descriptors);
        }
        for descriptors in tools.values_mut() {
            descriptors.sort_by_key(|t| t.priority);
        }
        Ok(Self {
            tools,
            locator,
            availability: RwLock::new(HashMap::new()),
        })
    }

    /// Builtin table plus user extensions, looked up on `PATH`
    pub fn with_extra(extra: BTreeMap<String, Vec<ToolDescriptor>>) -> Result<Self> {
        Self::with_extra_and_locator(extra, Arc::new(PathLocator))
    }

    pub fn with_extra_and_locator(
        extra: BTreeMap<String, Vec<ToolDescriptor>>,
        locator: Arc<dyn ToolLocator>,
    ) -> Result<Self> {
        let mut table = builtin_table();
        for (key, descriptors) in extra {
            table.entry(key).or_default().extend(descriptors);
        }
        Self::from_table(table, locator)
    }

    pub fn builtin() -> Result<Self> {
        Self::with_extra(BTreeMap::new())
    }

    pub fn language_for_file(&self, path: &Path) -> Option<Language> {
        Language::from_path(path)
    }

    /// Descriptors of one type for a language, ascending priority
    pub fn get_tools_for_language(&self, lang: Language, tool_type: ToolType) -> Vec<ToolDescriptor> {
        self.tools
            .get(&lang)
            .map(|tools| {
                tools
                    .iter()
                    .filter(|t| t.tool_type == tool_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Descriptors of one type applicable to a file, ascending priority
    pub fn get_tools_for_file(&self, path: &Path, tool_type: ToolType) -> Vec<ToolDescriptor> {
        let Some(lang) = Language::from_path(path) else {
            return Vec::new();
        };
        self.get_tools_for_language(lang, tool_type)
            .into_iter()
            .filter(|t| t.applies_to(path))
            .collect()
    }

    /// Installed check, memoised by tool name
    pub fn is_available(&self, tool: &ToolDescriptor) -> bool {
        if let Some(&known) = self.availability.read().get(&tool.name) {
            return known;
        }
        let installed = self.locator.is_installed(&tool.command);
        debug!(tool = %tool.name, command = %tool.command, installed, "Probed tool availability");
        self.availability
            .write()
            .insert(tool.name.clone(), installed);
        installed
    }

    /// Highest-priority installed tool of this type for the file
    pub fn first_available(&self, path: &Path, tool_type: ToolType) -> Option<ToolDescriptor> {
        self.get_tools_for_file(path, tool_type)
            .into_iter()
            .find(|t| self.is_available(t))
    }

    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self.tools.keys().copied().collect();
        langs.sort();
        langs
    }
}
