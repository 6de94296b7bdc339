//! 交互模式的行编辑辅助：SQL关键字补全、括号高亮、历史提示

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter, MatchingBracketHighlighter};
use rustyline::hint::HistoryHinter;
use rustyline::validate::MatchingBracketValidator;
use rustyline::Context;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow::{self, Borrowed, Owned};

#[derive(Helper, Completer, Hinter, Validator)]
pub struct SqlHelper {
    #[rustyline(Completer)]
    completer: SqlCompleter,
    #[rustyline(Highlighter)]
    highlighter: MatchingBracketHighlighter,
    #[rustyline(Validator)]
    validator: MatchingBracketValidator,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    colored_prompt: String,
}

impl SqlHelper {
    pub fn new() -> Self {
        Self {
            completer: SqlCompleter,
            highlighter: MatchingBracketHighlighter::new(),
            validator: MatchingBracketValidator::new(),
            hinter: HistoryHinter {},
            colored_prompt: "".to_owned(),
        }
    }

    pub fn with_colored_prompt(&mut self, prompt: String) {
        self.colored_prompt = prompt;
    }
}

impl Default for SqlHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SqlHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(format!("\x1b[1m{}\x1b[m", hint))
    }

    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: CmdKind) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}

pub struct SqlCompleter;

impl SqlCompleter {
    // 支持的SQL关键字
    const SQL_KEYWORDS: &'static [&'static str] = &[
        "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE",
        "CREATE", "TABLE", "DROP", "DESCRIBE", "EXPLAIN", "AND", "OR", "NOT", "NULL",
        "PRIMARY", "KEY", "UNIQUE", "TRUE", "FALSE", "INT", "INTEGER", "FLOAT", "VARCHAR",
    ];

    // 元命令
    const META_COMMANDS: &'static [&'static str] = &[".exit", ".quit", ".help", ".tables", ".save"];
}

impl Completer for SqlCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let line_up_to_pos = &line[..pos];

        // 元命令补全
        if line_up_to_pos.trim_start().starts_with('.') {
            let start = line_up_to_pos.rfind('.').unwrap_or(0);
            let prefix = &line_up_to_pos[start..];

            let matches: Vec<Pair> = Self::META_COMMANDS
                .iter()
                .filter(|&cmd| cmd.starts_with(prefix))
                .map(|&cmd| Pair {
                    display: cmd.to_string(),
                    replacement: cmd.to_string(),
                })
                .collect();

            return Ok((start, matches));
        }

        // SQL 关键字补全
        let word_start = line_up_to_pos
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ')' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);

        let prefix = line_up_to_pos[word_start..].to_uppercase();

        let matches: Vec<Pair> = Self::SQL_KEYWORDS
            .iter()
            .filter(|&keyword| keyword.starts_with(&prefix) && !prefix.is_empty())
            .map(|&keyword| Pair {
                display: keyword.to_string(),
                replacement: keyword.to_string(),
            })
            .collect();

        Ok((word_start, matches))
    }
}
