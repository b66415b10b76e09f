// UI prompts and user interaction module

use colored::Colorize;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{self, ClearType},
};
use std::io::{self, Write};

/// Ask user for yes/no confirmation
pub fn confirm(message: &str) -> io::Result<bool> {
    print!("{} ", message.white().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

/// Display a warning message
pub fn warn(message: &str) {
    println!("{}", format!("⚠️  Warning: {}", message).yellow().bold());
}

/// Display an info message
pub fn info(message: &str) {
    println!("{}", message.cyan());
}

/// Display a success message
pub fn success(message: &str) {
    println!("{}", message.green().bold());
}

/// Display an error message
pub fn error(message: &str) {
    eprintln!("{}", message.red().bold());
}

/// Display a dimmed/secondary message
pub fn dimmed(message: &str) {
    println!("{}", message.dimmed());
}

/// Interactive selection from a list of items
/// Returns the index of the selected item, or None if cancelled
pub fn select_from_list(title: &str, items: &[String]) -> io::Result<Option<usize>> {
    if items.is_empty() {
        return Ok(None);
    }

    let mut selected_index = 0;
    let mut stdout = io::stdout();

    terminal::enable_raw_mode().map_err(|e| {
        io::Error::other(format!(
            "Failed to enable raw mode: {}. Pass --port instead.",
            e
        ))
    })?;

    // Clear any pending events in the buffer
    while event::poll(std::time::Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    let result = run_selection_loop(title, items, &mut selected_index, &mut stdout);

    // Always disable raw mode, even if there was an error
    let _ = terminal::disable_raw_mode();
    println!();

    result
}

fn run_selection_loop(
    title: &str,
    items: &[String],
    selected_index: &mut usize,
    stdout: &mut io::Stdout,
) -> io::Result<Option<usize>> {
    loop {
        execute!(
            stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;

        println!("{}\r", title.white().bold());
        println!("\r");
        println!(
            "{}\r",
            "Use ↑/↓ arrows to navigate, Enter to select, Esc to cancel".dimmed()
        );
        println!("\r");

        for (index, item) in items.iter().enumerate() {
            if index == *selected_index {
                println!("  {} {}\r", "→".green().bold(), item.green().bold());
            } else {
                println!("    {}\r", item.dimmed());
            }
        }

        stdout.flush()?;

        match event::read()? {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Up => {
                    *selected_index = if *selected_index == 0 {
                        items.len() - 1
                    } else {
                        *selected_index - 1
                    };
                }
                KeyCode::Down => {
                    *selected_index = (*selected_index + 1) % items.len();
                }
                KeyCode::Enter => return Ok(Some(*selected_index)),
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(None),
                _ => {}
            },
            // Ignore non-keyboard events (mouse, resize, etc.)
            _ => {}
        }
    }
}
