use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::actions::ContextAction;
use crate::view::{SearchFilter, SortMode};

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bm",
    version,
    about = "Bookmark Pro: an in-memory folder/bookmark tree driven by shell commands",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "bookmarkrc")]
    pub bookmarkrc: Option<PathBuf>,

    /// Start from an empty root instead of the demo tree.
    #[arg(long = "empty")]
    pub empty: bool,

    /// Command script to run; stdin when omitted.
    pub script: Option<PathBuf>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls `rc.key=value` / `rc.key:value` tokens out of the argument list.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest
                .split_once('=')
                .or_else(|| rest.split_once(':'))
                .map(|(k, v)| (format!("rc.{k}"), v.to_string()));

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

/// One line of shell input.
#[derive(Parser, Debug, Clone)]
#[command(name = "bm", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// List the current folder (or the search results).
    #[command(alias = "list")]
    Ls,
    /// Enter a folder.
    Cd { folder: String },
    /// Go to the parent folder.
    Up,
    /// Print the current location.
    Pwd,
    /// Print the whole tree.
    Tree,
    /// Create a folder here.
    Mkdir {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Create a bookmark here.
    Add { name: String, url: String },
    Rename {
        id: String,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Delete items and everything below them.
    #[command(alias = "delete")]
    Rm {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Mv { id: String, folder: String },
    Cp { id: String, folder: String },
    /// Toggle selection of items.
    Select {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    SelectAll,
    Unselect,
    /// Copy items (or the selection) to the clipboard.
    Copy { ids: Vec<String> },
    /// Cut items (or the selection) to the clipboard.
    Cut { ids: Vec<String> },
    Paste,
    /// Search the whole tree; no words ends the search.
    Find { query: Vec<String> },
    Filter { filter: SearchFilter },
    Sort { mode: SortMode },
    /// Flip the sort direction.
    Reverse,
    Menu { id: String },
    /// Run a context-menu action.
    Do {
        action: ContextAction,
        id: Option<String>,
    },
    Info { id: String },
    Favicon { id: String },
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ShellCommand>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let words = split_words(trimmed)?;
    let parsed = ShellLine::try_parse_from(words)?;
    Ok(Some(parsed.command))
}

/// Splits on whitespace; double quotes group words and `\"` escapes a quote.
pub fn split_words(line: &str) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            '\\' if quoted => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err(anyhow!("unterminated quote in: {line}"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::{ShellCommand, parse_line, preprocess_args, split_words};
    use crate::actions::ContextAction;
    use crate::view::SortMode;

    #[test]
    fn split_words_honours_quotes() {
        assert_eq!(
            split_words(r#"add "Rust Book" doc.rust-lang.org/book"#).expect("split"),
            vec!["add", "Rust Book", "doc.rust-lang.org/book"]
        );
        assert_eq!(
            split_words(r#"rename x "say \"hi\"" "#).expect("split"),
            vec!["rename", "x", r#"say "hi""#]
        );
        assert_eq!(split_words(r#"mkdir """#).expect("split"), vec!["mkdir", ""]);
        assert!(split_words(r#"add "open"#).is_err());
    }

    #[test]
    fn parses_shell_commands() {
        assert_eq!(parse_line("  # comment").expect("parse"), None);
        assert_eq!(parse_line("ls").expect("parse"), Some(ShellCommand::Ls));
        assert_eq!(
            parse_line("mkdir Reading List").expect("parse"),
            Some(ShellCommand::Mkdir {
                name: vec!["Reading".to_string(), "List".to_string()],
            })
        );
        assert_eq!(
            parse_line("sort date").expect("parse"),
            Some(ShellCommand::Sort {
                mode: SortMode::Date
            })
        );
        assert_eq!(
            parse_line("do open-new-tab github_bm").expect("parse"),
            Some(ShellCommand::Do {
                action: ContextAction::OpenNewTab,
                id: Some("github_bm".to_string()),
            })
        );
        assert_eq!(
            parse_line("select-all").expect("parse"),
            Some(ShellCommand::SelectAll)
        );
        assert!(parse_line("sort weight").is_err());
        assert!(parse_line("explode").is_err());
    }

    #[test]
    fn preprocess_extracts_rc_overrides() {
        let raw: Vec<OsString> = ["bm", "rc.sort.mode=date", "-v", "rc.color:off", "script.bm"]
            .into_iter()
            .map(OsString::from)
            .collect();
        let pre = preprocess_args(&raw).expect("preprocess");
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.sort.mode".to_string(), "date".to_string()),
                ("rc.color".to_string(), "off".to_string()),
            ]
        );
        assert_eq!(pre.cleaned_args.len(), 3);
    }
}
