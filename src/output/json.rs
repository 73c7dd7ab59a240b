use crate::output::{OutputFormatter, Report};
use std::io::Write;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonOutput {
    pub pretty: bool,
}

impl JsonOutput {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonOutput {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, report)?;
        } else {
            serde_json::to_writer(&mut *writer, report)?;
        }
        writeln!(writer)
    }
}
