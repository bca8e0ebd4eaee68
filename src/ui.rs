// UI layer: the header, the file picker menu (`dialoguer` + a native dialog
// via `rfd`), the live progress bar (`indicatif`) and styled output of the
// view elements (`crossterm`).

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use crossterm::tty::IsTty;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::{info, warn};

use crate::api::Extractor;
use crate::media::{resolve_input_path, SelectedFile};
use crate::runner::UploadRunner;
use crate::session::UploadSession;
use crate::view::{self, Element, PROCESSING_MESSAGE};

const TITLE: &str = "Passport Data Extraction";
const DESCRIPTION: &str = "Upload a passport image and extract details with just a click!";
const UPLOADER_HEADING: &str = "Upload Your Passport";

/// Where the next file comes from.
enum Pick {
    Path,
    Browse,
    Exit,
}

/// Main interactive loop. Draws the header once, then lets the user pick
/// files until they choose "Exit". Each pick is one upload attempt.
pub fn main_menu(extractor: Arc<dyn Extractor>) -> Result<()> {
    let mut out = io::stdout();
    let inline_images = supports_inline_images();
    print_header(&mut out)?;

    let mut session = UploadSession::new();
    let mut runner = UploadRunner::new(extractor);

    loop {
        let file = match prompt_pick()? {
            Pick::Path => pick_by_path()?,
            Pick::Browse => pick_by_dialog(),
            Pick::Exit => break,
        };

        // Nothing should be queued between uploads; flush anything that is
        // so it cannot be mistaken for the next attempt's events.
        runner.drain(&mut session);
        let request = session.select_file(file);
        draw(&mut out, &session, &view::render(&session), inline_images)?;

        if let Some(request) = request {
            runner.start(request);
            let bar = progress_bar()?;
            runner.wait(&mut session, |s| bar.set_position(u64::from(s.progress_percent())));
            bar.finish_and_clear();

            let outcome: Vec<Element> = view::render(&session)
                .into_iter()
                .filter(|e| matches!(e, Element::Error(_) | Element::DataTable(_)))
                .collect();
            draw(&mut out, &session, &outcome, inline_images)?;
        }
    }
    Ok(())
}

/// Static branding block above the uploader.
fn print_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  🛂  {}", TITLE.bold())?;
    writeln!(out, "      {}", DESCRIPTION.dim())?;
    writeln!(out)?;
    writeln!(out, "{}", UPLOADER_HEADING.underlined())?;
    out.flush()
}

fn prompt_pick() -> Result<Pick> {
    let items = vec!["Enter image file path", "Browse for a file", "Exit"];
    let selection = Select::new()
        .with_prompt("Upload Passport Image")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(match selection {
        0 => Pick::Path,
        1 => Pick::Browse,
        _ => Pick::Exit,
    })
}

fn pick_by_path() -> Result<Option<SelectedFile>> {
    let input: String = Input::new()
        .with_prompt("Image file path")
        .allow_empty(true)
        .interact_text()?;
    Ok(resolve_input_path(&input).and_then(load))
}

fn pick_by_dialog() -> Option<SelectedFile> {
    let path = rfd::FileDialog::new()
        .set_title("Upload Passport Image")
        .pick_file()?;
    load(path)
}

/// A file that cannot be read counts as no file at all.
fn load(path: PathBuf) -> Option<SelectedFile> {
    match SelectedFile::open(&path) {
        Ok(file) => {
            info!(path = %path.display(), media_type = file.media_type(), "file selected");
            Some(file)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read selected file");
            None
        }
    }
}

// Drawn on stdout with the rest of the view; stderr is left to the logs.
fn progress_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stdout());
    bar.set_style(
        ProgressStyle::with_template("{msg}\n[{bar:40.green/white}] {pos}%")
            .context("Invalid progress bar template")?
            .progress_chars("=> "),
    );
    bar.set_message(PROCESSING_MESSAGE);
    Ok(bar)
}

/// Draw view elements. `Processing` is skipped: while an upload is live the
/// caller shows it as an `indicatif` bar.
fn draw(
    out: &mut impl Write,
    session: &UploadSession,
    elements: &[Element],
    inline_images: bool,
) -> io::Result<()> {
    for element in elements {
        match element {
            // The picker is the menu prompt itself.
            Element::FilePicker => {}
            Element::Preview { path, .. } => {
                writeln!(out, "{}", "Image Preview:".bold())?;
                match session.preview() {
                    Some(preview) if inline_images => writeln!(out, "{}", preview.inline_escape())?,
                    _ => writeln!(out, "  {}", path.display())?,
                }
            }
            Element::Processing { .. } => {}
            Element::Error(message) => writeln!(out, "{}", message.as_str().red())?,
            Element::DataTable(rows) => {
                writeln!(out, "{}", "Extracted Data:".bold())?;
                for (label, value) in rows {
                    writeln!(out, "  {}{}", format!("{:<18}", label).bold(), value)?;
                }
            }
        }
    }
    writeln!(out)?;
    out.flush()
}

/// iTerm2 and WezTerm understand the inline image escape; everything else
/// gets the preview path.
fn supports_inline_images() -> bool {
    io::stdout().is_tty()
        && matches!(
            std::env::var("TERM_PROGRAM").as_deref(),
            Ok("iTerm.app") | Ok("WezTerm")
        )
}
