//! Fixed-width text rendering of a [`GridView`].

use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use super::BodyView;
use super::EMPTY_MESSAGE;
use super::GridView;
use super::PaginationView;
use super::TableView;
use super::ToolbarView;
use crate::engine::CellContent;
use crate::engine::ColumnKind;
use crate::engine::Header;
use crate::query::SortOrder;

/// Pixels per terminal column.
const PIXELS_PER_CHAR: u32 = 8;

/// Narrowest a column is drawn.
const MIN_CHARS: usize = 3;

const SEPARATOR: &str = " | ";

/// Terminal columns for a pixel width.
pub fn char_width(pixels: u32) -> usize {
    ((pixels / PIXELS_PER_CHAR) as usize).max(MIN_CHARS)
}

/// Renders a view as plain text, one line per table row.
pub fn render_text(view: &GridView) -> String {
    match view {
        GridView::Error(error) => {
            let mut out = format!("{}\n", error.message);
            if error.retryable {
                out.push_str("[retry]\n");
            }
            out
        }
        GridView::Table(table) => render_table(table),
    }
}

fn render_table(table: &TableView) -> String {
    let widths: Vec<usize> = table.headers.iter().map(|header| char_width(header.width)).collect();
    let mut out = String::new();

    if let Some(toolbar) = &table.toolbar {
        render_toolbar(&mut out, toolbar);
    }

    let header_cells: Vec<String> = table.headers.iter().map(|header| header_text(header, table)).collect();
    push_line(&mut out, ' ', &header_cells, &widths);

    let total_width = widths.iter().sum::<usize>() + SEPARATOR.len() * widths.len().saturating_sub(1);
    out.push_str("  ");
    out.push_str(&"-".repeat(total_width));
    out.push('\n');

    match &table.body {
        BodyView::Skeleton { rows, columns } => {
            let cells: Vec<String> = widths.iter().take(*columns).map(|width| "░".repeat(*width)).collect();
            for _ in 0..*rows {
                push_line(&mut out, ' ', &cells, &widths);
            }
        }
        BodyView::Rows(rows) => {
            for row in rows {
                let cells: Vec<String> = row
                    .cells
                    .iter()
                    .map(|cell| match &cell.content {
                        CellContent::Text(text) => text.clone(),
                        CellContent::Checkbox(true) => "[x]".to_string(),
                        CellContent::Checkbox(false) => "[ ]".to_string(),
                    })
                    .collect();
                push_line(&mut out, if row.focused { '>' } else { ' ' }, &cells, &widths);
            }
        }
        BodyView::Empty { .. } => {
            out.push_str("  ");
            out.push_str(&center(EMPTY_MESSAGE, total_width));
            out.push('\n');
        }
    }

    if let Some(pagination) = &table.pagination {
        render_pagination(&mut out, pagination);
    }
    out
}

fn header_text(header: &Header, table: &TableView) -> String {
    if header.kind == ColumnKind::Select {
        return if table.all_rows_selected {
            "[x]".to_string()
        } else if table.some_rows_selected {
            "[-]".to_string()
        } else {
            "[ ]".to_string()
        };
    }
    let mut text = header.label.clone();
    match header.sort {
        Some(SortOrder::Asc) => text.push_str(" ^"),
        Some(SortOrder::Desc) => text.push_str(" v"),
        None => {}
    }
    if header.is_resizing {
        text.push_str(" <>");
    }
    text
}

fn render_toolbar(out: &mut String, toolbar: &ToolbarView) {
    let mut line = format!("Search: {}", if toolbar.search.is_empty() { "-" } else { toolbar.search.as_str() });
    if let Some(range) = &toolbar.date_range {
        let from = range.from.map(|date| date.to_string()).unwrap_or_default();
        let to = range.to.map(|date| date.to_string()).unwrap_or_default();
        line.push_str(&format!("  Created: {} .. {}", from, to));
    }
    if toolbar.show_bulk_actions {
        line.push_str(&format!("  {} selected [clear]", toolbar.selected_count));
    }
    if toolbar.can_export {
        line.push_str("  [export]");
    }
    if toolbar.can_reset_sizing {
        line.push_str("  [reset sizes]");
    }
    out.push_str(&line);
    out.push('\n');

    if !toolbar.columns.is_empty() {
        let columns: Vec<String> = toolbar
            .columns
            .iter()
            .map(|column| format!("{}{}", if column.visible { "+" } else { "-" }, column.label))
            .collect();
        out.push_str(&format!("Columns: {}\n", columns.join(" ")));
    }
}

fn render_pagination(out: &mut String, pagination: &PaginationView) {
    let options: Vec<String> = pagination
        .page_size_options
        .iter()
        .map(|size| {
            if *size == pagination.page_size {
                format!("[{}]", size)
            } else {
                size.to_string()
            }
        })
        .collect();
    let button = |enabled: bool, label: &str| if enabled { label.to_string() } else { " ".repeat(label.len()) };
    out.push_str(&format!(
        "{}  Rows per page: {}  {}  {} {} {} {}\n",
        pagination.selection_summary,
        options.join(" "),
        pagination.page_label,
        button(pagination.can_first, "<<"),
        button(pagination.can_previous, "<"),
        button(pagination.can_next, ">"),
        button(pagination.can_last, ">>"),
    ));
}

fn push_line(out: &mut String, marker: char, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| fit(cell, *width))
        .collect();
    out.push(marker);
    out.push(' ');
    out.push_str(line.join(SEPARATOR).trim_end());
    out.push('\n');
}

/// Truncates or pads `text` to exactly `width` terminal columns.
fn fit(text: &str, width: usize) -> String {
    let text_width = text.width();
    if text_width <= width {
        return format!("{}{}", text, " ".repeat(width - text_width));
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn center(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.width()) / 2;
    format!("{}{}", " ".repeat(padding), text)
}
