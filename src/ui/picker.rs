use crate::error::{Error, Result};
use log::{debug, warn};
use std::io::{BufWriter, Write};
use std::process::{Command, ExitStatus, Stdio};

/// Shows a list and returns the user's choice, or `None` when they cancel.
pub trait Picker {
    fn pick(&mut self, items: &[String]) -> Result<Option<String>>;
}

/// A line-oriented picker subprocess such as `dmenu`: items go to its stdin,
/// the selection comes back as the first line of its stdout.
pub struct DmenuPicker {
    program: String,
    args: Vec<String>,
}

impl DmenuPicker {
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(Error::PickerEmpty)?;
        Ok(Self { program, args: parts.collect() })
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Picker for DmenuPicker {
    fn pick(&mut self, items: &[String]) -> Result<Option<String>> {
        debug!("Picker: showing {} items", items.len());
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| Error::PickerSpawn { command: self.command_line(), source })?;

        if let Some(stdin) = child.stdin.take() {
            // Dropping the writer closes the pipe so the picker sees EOF.
            let mut writer = BufWriter::new(stdin);
            write_items(&mut writer, items)?;
            writer.flush()?;
        }

        let output = child.wait_with_output()?;
        selection(&output.stdout, output.status)
    }
}

fn write_items<W: Write>(out: &mut W, items: &[String]) -> std::io::Result<()> {
    for item in items {
        if item.contains('\n') {
            warn!("Skipping item with embedded newline: {:?}", item);
            continue;
        }
        out.write_all(item.as_bytes())?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

// dmenu exits 1 on escape, so only death by signal counts as abnormal.
fn selection(stdout: &[u8], status: ExitStatus) -> Result<Option<String>> {
    if status.code().is_none() {
        return Err(Error::PickerExit(status));
    }
    let text = String::from_utf8_lossy(stdout);
    let choice = text.lines().next().unwrap_or("").trim();
    if choice.is_empty() {
        Ok(None)
    } else {
        Ok(Some(choice.to_string()))
    }
}
