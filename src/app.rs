// Console front-end for a caption session
//
// Commands:
// - n / p: next / previous image (wraps around)
// - g N: go to image N (1-based, as shown by `l`)
// - t TEXT: set title
// - d TEXT: set description (`\n` inserts a line break)
// - u: undo, reload the caption from disk
// - l: list images with thumbnail status
// - s: show the current image and caption
// - q: save if needed and quit

use std::io::{BufRead, Write};

use anyhow::Result;
use flume::Receiver;
use tracing::debug;

use crate::captions::{CaptionBackend, CaptionSession, CaptionStore, SessionEvent, WarningKind};
use crate::models::CaptionField;

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    Goto(usize),
    Title(String),
    Description(String),
    Undo,
    List,
    Show,
    Quit,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let (word, rest) = match line.trim_start().split_once(' ') {
            Some((word, rest)) => (word, rest),
            None => (line.trim(), ""),
        };

        match word {
            "n" | "next" => Some(Self::Next),
            "p" | "prev" | "previous" => Some(Self::Previous),
            "g" | "go" => {
                let n: usize = rest.trim().parse().ok()?;
                n.checked_sub(1).map(Self::Goto)
            }
            "t" | "title" => Some(Self::Title(rest.to_string())),
            "d" | "desc" => Some(Self::Description(rest.replace("\\n", "\n"))),
            "u" | "undo" => Some(Self::Undo),
            "l" | "list" => Some(Self::List),
            "s" | "show" => Some(Self::Show),
            "q" | "quit" => Some(Self::Quit),
            "h" | "help" | "?" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Thumbnail state of one list row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoration {
    Pending,
    Ready(u32, u32),
    Failed,
}

pub struct CaptionApp<B = CaptionStore> {
    session: CaptionSession<B>,
    events: Receiver<SessionEvent>,
    decorations: Vec<Decoration>,
}

impl<B: CaptionBackend> CaptionApp<B> {
    pub fn new(session: CaptionSession<B>, events: Receiver<SessionEvent>) -> Self {
        let decorations = vec![Decoration::Pending; session.assets().len()];
        Self {
            session,
            events,
            decorations,
        }
    }

    /// Run commands from `input` until quit or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        self.flush_events(out)?;
        self.show(out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => {
                    writeln!(out)?;
                    if self.quit(out)? {
                        return Ok(());
                    }
                    // Input is gone, nothing more can be acknowledged.
                    anyhow::bail!("could not save caption before exit");
                }
            };

            // One thumbnail per command keeps each prompt responsive.
            self.session.pump_thumbnail();

            if line.trim().is_empty() {
                self.flush_events(out)?;
                continue;
            }

            let Some(command) = Command::parse(&line) else {
                writeln!(out, "unknown command, type h for help")?;
                continue;
            };
            debug!(?command, "Console command");
            let reshow = matches!(
                command,
                Command::Next | Command::Previous | Command::Goto(_) | Command::Undo | Command::Show
            );

            let outcome = match command {
                Command::Next => self.session.next(),
                Command::Previous => self.session.previous(),
                Command::Goto(index) => self.session.select(index),
                Command::Title(text) => self.session.edit(CaptionField::Title, text),
                Command::Description(text) => self.session.edit(CaptionField::Description, text),
                Command::Undo => self.session.revert(),
                Command::List => {
                    self.flush_events(out)?;
                    self.list(out)?;
                    continue;
                }
                Command::Show => Ok(()),
                Command::Help => {
                    writeln!(out, "n next | p previous | g N go to | t TEXT title | d TEXT description")?;
                    writeln!(out, "u undo | l list | s show | q quit")?;
                    continue;
                }
                Command::Quit => {
                    if self.quit(out)? {
                        return Ok(());
                    }
                    continue;
                }
            };

            if let Err(e) = outcome {
                writeln!(out, "error: {e}")?;
                writeln!(out, "(retry, or u to discard the edit)")?;
            }
            self.flush_events(out)?;
            if reshow {
                self.show(out)?;
            }
        }
    }

    /// Close the session; false if the final save failed.
    fn quit<W: Write>(&mut self, out: &mut W) -> Result<bool> {
        match self.session.close() {
            Ok(()) => Ok(true),
            Err(e) => {
                writeln!(out, "error: {e}")?;
                writeln!(out, "(retry q, or u to discard the edit)")?;
                Ok(false)
            }
        }
    }

    fn flush_events<W: Write>(&mut self, out: &mut W) -> Result<()> {
        for event in self.events.try_iter() {
            match event {
                SessionEvent::ThumbnailReady { position, image } => {
                    if let Some(slot) = self.decorations.get_mut(position) {
                        *slot = match image {
                            Some(img) => Decoration::Ready(img.width(), img.height()),
                            None => Decoration::Failed,
                        };
                    }
                }
                SessionEvent::Warning { kind, message } => {
                    let label = match kind {
                        WarningKind::ImageDecode => "cannot load image",
                        WarningKind::SkippedMetadata => "skipped",
                        WarningKind::SidecarUnreadable => "cannot read caption",
                    };
                    writeln!(out, "warning ({label}): {message}")?;
                }
                SessionEvent::ImageLoaded {
                    index,
                    width,
                    height,
                } => {
                    debug!(index, width, height, "Image loaded");
                }
                SessionEvent::CaptionLoaded { index, .. } => {
                    debug!(index, "Caption loaded");
                }
            }
        }
        Ok(())
    }

    fn show<W: Write>(&self, out: &mut W) -> Result<()> {
        let Some(index) = self.session.current_index() else {
            return Ok(());
        };
        let asset = &self.session.assets()[index];
        let record = self.session.record();
        let marker = if self.session.is_dirty() { " *" } else { "" };
        writeln!(
            out,
            "[{}/{}] {}{}",
            index + 1,
            self.session.assets().len(),
            asset.display_name(),
            marker
        )?;
        if let Some(img) = self.session.preview() {
            writeln!(out, "  image: {}x{}", img.width(), img.height())?;
        }
        writeln!(out, "  title: {}", record.title)?;
        writeln!(out, "  description: {}", record.description.replace('\n', "\n               "))?;
        Ok(())
    }

    fn list<W: Write>(&self, out: &mut W) -> Result<()> {
        let current = self.session.current_index();
        for (i, asset) in self.session.assets().iter().enumerate() {
            let cursor = if Some(i) == current { '>' } else { ' ' };
            let thumb = match self.decorations[i] {
                Decoration::Pending => "...".to_string(),
                Decoration::Ready(w, h) => format!("{w}x{h}"),
                Decoration::Failed => "n/a".to_string(),
            };
            writeln!(out, "{cursor}{:>4} {:>9}  {}", i + 1, thumb, asset.display_name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{ImageAsset, SortKey};
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("n"), Some(Command::Next));
        assert_eq!(Command::parse("prev\n"), Some(Command::Previous));
        assert_eq!(Command::parse("g 3"), Some(Command::Goto(2)));
        assert_eq!(Command::parse("g 0"), None);
        assert_eq!(Command::parse("g x"), None);
        assert_eq!(
            Command::parse("t  Sunset at sea"),
            Some(Command::Title(" Sunset at sea".to_string()))
        );
        assert_eq!(
            Command::parse("d line one\\nline two"),
            Some(Command::Description("line one\nline two".to_string()))
        );
        assert_eq!(Command::parse("t"), Some(Command::Title(String::new())));
        assert_eq!(Command::parse("zzz"), None);
    }

    fn app_in(dir: &std::path::Path, names: &[&str]) -> CaptionApp {
        let assets = names
            .iter()
            .map(|n| {
                let path = dir.join(n);
                image::RgbImage::new(4, 4).save(&path).unwrap();
                ImageAsset::new(SortKey::new("2020:01:01 00:00:00", "", path))
            })
            .collect();
        let (tx, rx) = flume::unbounded();
        let session = CaptionSession::new(assets, CaptionStore::new(), &Config::default(), tx);
        CaptionApp::new(session, rx)
    }

    #[test]
    fn test_run_edits_and_saves() {
        let dir = tempdir().unwrap();
        let mut app = app_in(dir.path(), &["a.png", "b.png"]);

        let input = Cursor::new("t Beach\nd Waves\\nand sand\nn\nt Hills\nq\n");
        let mut out = Vec::new();
        app.run(input, &mut out).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "Beach\nWaves\nand sand"
        );
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "Hills\n");
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("[2/2] b.png"));
    }

    #[test]
    fn test_end_of_input_saves() {
        let dir = tempdir().unwrap();
        let mut app = app_in(dir.path(), &["a.png"]);
        let mut out = Vec::new();
        app.run(Cursor::new("t Last\n"), &mut out).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "Last\n");
    }

    #[test]
    fn test_undo_keeps_disk_version() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "Kept\n").unwrap();
        let mut app = app_in(dir.path(), &["a.png", "b.png"]);
        let mut out = Vec::new();
        app.run(Cursor::new("t Scratch\nu\nn\nq\n"), &mut out).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "Kept\n");
    }

    #[test]
    fn test_unreadable_caption_is_reported_and_kept() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("a.txt")).unwrap();
        let mut app = app_in(dir.path(), &["a.png", "b.png"]);
        let mut out = Vec::new();
        app.run(Cursor::new("t New
n
u
n
q
"), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("warning (cannot read caption)"));
        assert!(out.contains("not overwriting it"));
        assert!(out.contains("[2/2] b.png"));
        assert!(dir.path().join("a.txt").is_dir());
    }

    #[test]
    fn test_unknown_command_and_bad_index() {
        let dir = tempdir().unwrap();
        let mut app = app_in(dir.path(), &["a.png", "b.png"]);
        let mut out = Vec::new();
        app.run(Cursor::new("wat\ng 9\nq\n"), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("unknown command"));
        assert!(out.contains("error: index 8 out of range for 2 images"));
    }
}
