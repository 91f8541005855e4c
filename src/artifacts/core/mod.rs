//! Output plumbing shared by commands
//!
//! Command output goes to stdout, or through the `minus` pager when stdout is
//! a terminal and `NO_PAGER` is not set.

use derive_new::new;
use is_terminal::IsTerminal;
use minus::Pager;
use std::io::{self, Write};

pub const NO_PAGER_ENV: &str = "NO_PAGER";

/// Wrapper that implements `Write` for the minus pager
///
/// ```ignore
/// let pager = Pager::new();
/// let mut writer = PagerWriter::new(pager.clone());
/// writeln!(writer, "untracked: deep (directory)")?;
/// minus::page_all(pager)?;
/// ```
#[derive(new)]
pub struct PagerWriter {
    pager: Pager,
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(s).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Where a command writes, plus the pager to hand control to once it is done
pub struct Output {
    writer: Box<dyn Write>,
    pager: Option<Pager>,
}

impl Output {
    pub fn detect() -> Self {
        if Self::pager_disabled() {
            Self::stdout()
        } else {
            let pager = Pager::new();
            Output {
                writer: Box::new(PagerWriter::new(pager.clone())),
                pager: Some(pager),
            }
        }
    }

    pub fn stdout() -> Self {
        Output {
            writer: Box::new(io::stdout()),
            pager: None,
        }
    }

    pub fn into_parts(self) -> (Box<dyn Write>, Option<Pager>) {
        (self.writer, self.pager)
    }

    fn pager_disabled() -> bool {
        std::env::var_os(NO_PAGER_ENV).is_some() || !io::stdout().is_terminal()
    }
}

/// Show everything written to `pager`, if there is one
pub fn page(pager: Option<Pager>) -> anyhow::Result<()> {
    if let Some(pager) = pager {
        minus::page_all(pager)?;
    }

    Ok(())
}
