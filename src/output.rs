//! Output formatting for streamed search results and the final summary

use crate::search::types::{FoundEntry, SearchStatistics};
use crate::utils::format_size;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Labelled statistics in display order, shared with the TUI stats panel
pub fn summary_rows(stats: &SearchStatistics) -> Vec<(&'static str, String)> {
    vec![
        ("Directories enumerated", stats.directories_enumerated.to_string()),
        ("Files enumerated", stats.files_enumerated.to_string()),
        ("File contents searched", stats.file_contents_searched.to_string()),
        ("Results found", stats.results_found.to_string()),
        ("Total file size", format_size(stats.total_file_size)),
        ("Scanned file size", format_size(stats.scanned_file_size)),
        ("Search time", format_search_time(stats.search_time_secs)),
    ]
}

pub fn format_search_time(secs: f64) -> String {
    format!("{:.3} seconds", secs)
}

/// One-line status used by the spinner and the TUI footer
pub fn progress_message(stats: &SearchStatistics, fraction: Option<f64>) -> String {
    let mut message = format!(
        "{} dirs, {} files, {} found",
        stats.directories_enumerated, stats.files_enumerated, stats.results_found
    );
    match fraction {
        Some(fraction) => message.push_str(&format!(
            " - scanning contents {:.0}%",
            (fraction * 100.0).clamp(0.0, 100.0)
        )),
        None => message.push_str(" - enumerating"),
    }
    message
}

fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Write a found entry: directories in blue, files with their size
pub fn write_entry<W: WriteColor>(out: &mut W, entry: &FoundEntry) -> io::Result<()> {
    if entry.is_dir {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true))?;
        write!(out, "{}{}", entry.path.display(), std::path::MAIN_SEPARATOR)?;
        out.reset()?;
        writeln!(out)?;
        return Ok(());
    }

    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
    write!(out, "{}", entry.path.display())?;
    out.reset()?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    writeln!(out, "  {}", format_size(entry.size))?;
    out.reset()?;
    Ok(())
}

pub fn print_entry(entry: &FoundEntry, color: bool) -> io::Result<()> {
    write_entry(&mut stdout(color), entry)
}

/// Write the human-readable summary block
pub fn write_summary<W: WriteColor>(out: &mut W, stats: &SearchStatistics) -> io::Result<()> {
    let rows = summary_rows(stats);
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    writeln!(out)?;
    for (label, value) in rows {
        write!(out, "{:width$}  ", label, width = width)?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
        writeln!(out, "{}", value)?;
        out.reset()?;
    }
    Ok(())
}

pub fn print_summary(stats: &SearchStatistics, color: bool) -> io::Result<()> {
    write_summary(&mut stdout(color), stats)
}

pub fn summary_json(stats: &SearchStatistics) -> serde_json::Result<String> {
    serde_json::to_string_pretty(stats)
}
