//! Interactive loop: stdin commands and fetch completions, redrawn after
//! every event.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use datagrid_lib::DataGrid;
use datagrid_lib::KeyOutcome;
use datagrid_lib::fetch::FetchCompletion;
use datagrid_lib::view::render_text;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::commands;
use crate::commands::Command;
use crate::user::User;

pub async fn run(mut grid: DataGrid<User>, mut completions: UnboundedReceiver<FetchCompletion<User>>) -> Result<()> {
    grid.mount().await;
    draw(&grid);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            completion = completions.recv() => {
                let Some(completion) = completion else { break };
                if grid.complete(completion) {
                    draw(&grid);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else { break };
                match commands::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => {
                        let message = execute(&mut grid, command).await;
                        draw(&grid);
                        match message {
                            Ok(Some(message)) => println!("{}", message),
                            Ok(None) => {}
                            Err(e) => println!("error: {:#}", e),
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("error: {:#}", e),
                }
            }
        }
    }

    log::info!("bye");
    Ok(())
}

fn draw(grid: &DataGrid<User>) {
    println!();
    if grid.fetch_state().is_loading {
        println!("(loading)");
    }
    print!("{}", render_text(&grid.view()));
}

/// Runs a command. Returns a message to show under the table.
async fn execute(grid: &mut DataGrid<User>, command: Command) -> Result<Option<String>> {
    let unchanged = |changed: bool, what: &str| (!changed).then(|| format!("{}: nothing to do", what));

    let message = match command {
        Command::Search(text) => {
            grid.set_search(text);
            None
        }
        Command::Sort(column) => unchanged(grid.toggle_sort(&column), "sort"),
        Command::Page(page) => unchanged(grid.set_page(page), "page"),
        Command::Size(size) => {
            if !grid.config().page_size_options.contains(&size) {
                Some(format!("rows per page must be one of {:?}", grid.config().page_size_options))
            } else {
                unchanged(grid.set_page_size(size), "size")
            }
        }
        Command::Next => unchanged(grid.next_page(), "next"),
        Command::Prev => unchanged(grid.previous_page(), "prev"),
        Command::First => unchanged(grid.first_page(), "first"),
        Command::Last => unchanged(grid.last_page(), "last"),
        Command::Select(row) => unchanged(grid.toggle_row(row), "select"),
        Command::Focus(row) => unchanged(grid.focus_row(row), "focus"),
        Command::Key(key) => match grid.handle_key(key) {
            KeyOutcome::Ignored => Some("key ignored".to_string()),
            KeyOutcome::Toggled(_) => None,
            KeyOutcome::Activated(index) => grid
                .rows()
                .get(index)
                .map(|user| format!("activated {} <{}>", user.name, user.email)),
        },
        Command::Click(row) => unchanged(grid.click_row(row), "click"),
        Command::All => unchanged(grid.toggle_page_rows(), "all"),
        Command::Clear => {
            grid.clear_selection();
            None
        }
        Command::Hide(column) => unchanged(grid.set_column_visible(&column, false), "hide"),
        Command::Show(column) => unchanged(grid.set_column_visible(&column, true), "show"),
        Command::Filter { column, value } => unchanged(
            grid.set_column_filter(&column, value.map(serde_json::Value::String)),
            "filter",
        ),
        Command::Resize { column, width } => unchanged(grid.set_column_width(&column, width).await, "resize"),
        Command::ResetSizes => {
            grid.reset_column_sizing().await;
            None
        }
        Command::From(from) => {
            let to = grid.query().date_range.to;
            grid.set_date_range(from, to);
            None
        }
        Command::To(to) => {
            let from = grid.query().date_range.from;
            grid.set_date_range(from, to);
            None
        }
        Command::Export(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from(grid.export_file_name(chrono::Local::now().date_naive())));
            let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
            let count = grid.export_csv(BufWriter::new(file))?;
            Some(format!("exported {} rows to {}", count, path.display()))
        }
        Command::Retry => unchanged(grid.retry(), "retry"),
        Command::Link => Some(match grid.location() {
            Some(url) => url.to_string(),
            None => "url state is disabled".to_string(),
        }),
        Command::Help => Some(commands::HELP.to_string()),
        Command::Quit => None,
    };
    Ok(message)
}
