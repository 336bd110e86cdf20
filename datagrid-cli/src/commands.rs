//! Line commands typed on stdin.

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use chrono::NaiveDate;
use datagrid_lib::Key;

pub const HELP: &str = "\
commands:
  search [text]         filter by text (empty clears)
  sort <column>         cycle sorting on a column
  page <n> | size <n>   go to page n | set rows per page
  next | prev | first | last
  select <row>          toggle selection of a row (1-based)
  focus <row>           focus a row
  key space|enter       press a key on the focused row
  click <row>           click a row
  all | clear           toggle every row on the page | clear the selection
  hide <column> | show <column>
  filter <column> [value]
  resize <column> <px>  | reset-sizes
  from [YYYY-MM-DD] | to [YYYY-MM-DD]
  export [path]         write selected (or all) rows of the page as CSV
  retry | link | help | quit";

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Sort(String),
    Page(u32),
    Size(u32),
    Next,
    Prev,
    First,
    Last,
    Select(usize),
    Focus(usize),
    Key(Key),
    Click(usize),
    All,
    Clear,
    Hide(String),
    Show(String),
    Filter { column: String, value: Option<String> },
    Resize { column: String, width: u32 },
    ResetSizes,
    From(Option<NaiveDate>),
    To(Option<NaiveDate>),
    Export(Option<PathBuf>),
    Retry,
    Link,
    Help,
    Quit,
}

/// Parses a line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        "search" => Command::Search(rest.to_string()),
        "sort" => Command::Sort(word(rest, "column")?),
        "page" => Command::Page(number(rest, "page")?),
        "size" => Command::Size(number(rest, "page size")?),
        "next" => Command::Next,
        "prev" => Command::Prev,
        "first" => Command::First,
        "last" => Command::Last,
        "select" => Command::Select(row(rest)?),
        "focus" => Command::Focus(row(rest)?),
        "click" => Command::Click(row(rest)?),
        "key" => Command::Key(match rest {
            "space" => Key::Space,
            "enter" => Key::Enter,
            other => bail!("unknown key '{}', expected space or enter", other),
        }),
        "all" => Command::All,
        "clear" => Command::Clear,
        "hide" => Command::Hide(word(rest, "column")?),
        "show" => Command::Show(word(rest, "column")?),
        "filter" => {
            let (column, value) = match rest.split_once(char::is_whitespace) {
                Some((column, value)) => (column, Some(value.trim().to_string())),
                None => (rest, None),
            };
            Command::Filter {
                column: word(column, "column")?,
                value,
            }
        }
        "resize" => {
            let Some((column, width)) = rest.split_once(char::is_whitespace) else {
                bail!("usage: resize <column> <px>");
            };
            Command::Resize {
                column: column.to_string(),
                width: number(width.trim(), "width")?,
            }
        }
        "reset-sizes" => Command::ResetSizes,
        "from" => Command::From(date(rest)?),
        "to" => Command::To(date(rest)?),
        "export" => Command::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "retry" => Command::Retry,
        "link" => Command::Link,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command '{}', type 'help'", other),
    };
    Ok(Some(command))
}

fn word(rest: &str, what: &str) -> Result<String> {
    if rest.is_empty() {
        bail!("missing {}", what);
    }
    Ok(rest.to_string())
}

fn number(rest: &str, what: &str) -> Result<u32> {
    rest.parse().with_context(|| format!("invalid {} '{}'", what, rest))
}

/// 1-based row number to page index.
fn row(rest: &str) -> Result<usize> {
    let row: usize = rest.parse().with_context(|| format!("invalid row '{}'", rest))?;
    if row == 0 {
        bail!("rows are numbered from 1");
    }
    Ok(row - 1)
}

fn date(rest: &str) -> Result<Option<NaiveDate>> {
    if rest.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(rest, "%Y-%m-%d")
        .map(Some)
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", rest))
}
