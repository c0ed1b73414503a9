//! Human-readable and JSON renderings of a [`CpuX86`] snapshot.

use std::io::Write;

use serde::Serialize;
use thiserror::Error;

use crate::core::hardware::{CpuX86, Group, FEATURE_BITS};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub label: &'static str,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub rows: Vec<Row>,
}

impl Section {
    fn new(title: &'static str, rows: impl IntoIterator<Item = (&'static str, bool)>) -> Self {
        let rows = rows.into_iter().map(|(label, value)| Row { label, value }).collect();
        Self { title, rows }
    }
}

/// The Yes/No report, grouped the same way for text and for tests.
pub fn sections(cpu: &CpuX86) -> Vec<Section> {
    let mut out = vec![
        Section::new("CPU Vendor", [("AMD", cpu.vendor_amd), ("Intel", cpu.vendor_intel)]),
        Section::new(
            "OS Features",
            [("64-bit", cpu.os_x64), ("OS AVX", cpu.os_avx), ("OS AVX512", cpu.os_avx512)],
        ),
    ];

    for group in Group::ALL {
        let rows = FEATURE_BITS
            .iter()
            .filter(|fb| fb.group == group)
            .map(|fb| (fb.name, fb.get(cpu)));
        out.push(Section::new(group.title(), rows));
    }

    out.push(Section::new(
        "Summary",
        [("Safe to use AVX", cpu.safe_avx()), ("Safe to use AVX512", cpu.safe_avx512())],
    ));
    out
}

pub fn write_text<W: Write>(cpu: &CpuX86, out: &mut W) -> Result<(), ReportError> {
    writeln!(out, "CPU Vendor String: {}", cpu.vendor_string())?;
    writeln!(out)?;

    for section in sections(cpu) {
        let width = section.rows.iter().map(|r| r.label.len()).max().unwrap_or(0).max(11);
        writeln!(out, "{}:", section.title)?;
        for row in &section.rows {
            let answer = if row.value { "Yes" } else { "No" };
            writeln!(out, "    {:<width$} = {}", row.label, answer, width = width)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    cpu: &'a CpuX86,
    safe_avx: bool,
    safe_avx512: bool,
}

pub fn write_json<W: Write>(cpu: &CpuX86, out: &mut W, pretty: bool) -> Result<(), ReportError> {
    let report = JsonReport { cpu, safe_avx: cpu.safe_avx(), safe_avx512: cpu.safe_avx512() };
    if pretty {
        serde_json::to_writer_pretty(&mut *out, &report)?;
    } else {
        serde_json::to_writer(&mut *out, &report)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hardware::VendorId;

    fn sample() -> CpuX86 {
        CpuX86 {
            vendor: VendorId(*b"AuthenticAMD"),
            vendor_amd: true,
            os_x64: true,
            os_avx: true,
            hw_avx: true,
            hw_avx512_f: true,
            hw_sse4a: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_every_flag_listed_once() {
        let cpu = CpuX86::default();
        let rows: usize = sections(&cpu).iter().map(|s| s.rows.len()).sum();
        // 2 vendor + 3 OS + hardware table + 2 summary
        assert_eq!(rows, 2 + 3 + FEATURE_BITS.len() + 2);
    }

    #[test]
    fn test_text_report() -> Result<(), Box<dyn std::error::Error>> {
        let mut buf = Vec::new();
        write_text(&sample(), &mut buf)?;
        let text = String::from_utf8(buf)?;

        assert!(text.starts_with("CPU Vendor String: AuthenticAMD\n"));
        assert!(text.contains("    AMD         = Yes\n"));
        assert!(text.contains("    Intel       = No\n"));
        assert!(text.contains("    SSE4a       = Yes\n"));
        assert!(text.contains("    AVX512-F         = Yes\n"));
        assert!(text.contains("    Safe to use AVX    = Yes\n"));
        assert!(text.contains("    Safe to use AVX512 = No\n"));
        Ok(())
    }

    #[test]
    fn test_json_report() -> Result<(), Box<dyn std::error::Error>> {
        let mut buf = Vec::new();
        write_json(&sample(), &mut buf, false)?;
        let value: serde_json::Value = serde_json::from_slice(&buf)?;

        assert_eq!(value["vendor"], "AuthenticAMD");
        assert_eq!(value["vendor_amd"], true);
        assert_eq!(value["hw_avx512_f"], true);
        assert_eq!(value["os_avx512"], false);
        assert_eq!(value["safe_avx"], true);
        assert_eq!(value["safe_avx512"], false);
        Ok(())
    }
}
