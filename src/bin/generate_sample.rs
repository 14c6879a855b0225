//! Writes a set of realistic sample SCADA exports plus a small ledger into
//! `sample_data/`, for manual testing of the viewer:
//!
//! ```bash
//! cargo run --bin generate_sample
//! cargo run   # then File → Open batch files… → sample_data/*.csv
//! ```

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const OUT_DIR: &str = "sample_data";

struct SampleBatch {
    filename: &'static str,
    start: NaiveDateTime,
    /// Plateau temperature in °C; pressure tracks it loosely.
    plateau: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let batches = [
        SampleBatch {
            filename: "BA-03-25.csv",
            start: day(2025, 3, 1).and_hms_opt(8, 0, 0).unwrap(),
            plateau: 24.0,
        },
        SampleBatch {
            filename: "BA-04-25_R2.csv",
            start: day(2025, 3, 8).and_hms_opt(14, 30, 0).unwrap(),
            plateau: 26.5,
        },
        SampleBatch {
            filename: "Copia de GPF-12-26.csv",
            start: day(2025, 3, 15).and_hms_opt(6, 0, 0).unwrap(),
            plateau: 22.0,
        },
    ];

    std::fs::create_dir_all(OUT_DIR).context("creating sample_data/")?;

    for batch in &batches {
        let path = Path::new(OUT_DIR).join(batch.filename);
        std::fs::write(&path, render_export(batch)).with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
    }

    let ledger_path = Path::new(OUT_DIR).join("ledger.csv");
    std::fs::write(&ledger_path, render_ledger()).context("writing ledger")?;
    println!("wrote {}", ledger_path.display());

    Ok(())
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Long-format export: one row per (timestamp, variable), semicolon
/// separated, 15-minute sampling over 48 hours.
fn render_export(batch: &SampleBatch) -> String {
    let mut out = String::from("VarName;TimeString;VarValue;Validity\n");

    let steps = 48 * 4;
    for i in 0..steps {
        let t = batch.start + Duration::minutes(15 * i);
        let hours = i as f64 * 0.25;

        // Logistic ramp toward the plateau with a slow wobble.
        let temp = 16.0
            + (batch.plateau - 16.0) / (1.0 + (-0.35 * (hours - 10.0)).exp())
            + 0.3 * (hours * 0.7).sin();
        let pres = 0.2 + 1.4 / (1.0 + (-0.30 * (hours - 14.0)).exp()) + 0.05 * (hours * 0.9).cos();

        let stamp = t.format("%d/%m/%Y %H:%M:%S");
        writeln!(out, "GPF_T1.Output_registro;{stamp};{temp:.2};1").unwrap();
        writeln!(out, "GPF_P1.Output_registro;{stamp};{pres:.3};1").unwrap();
        // An unrelated variable the extractor is expected to ignore.
        if i % 16 == 0 {
            writeln!(out, "GPF_pH.Output_registro;{stamp};5.1;1").unwrap();
        }
    }

    // A couple of rows the pipeline must drop.
    writeln!(out, "GPF_T1.Output_registro;$RT_OFF$;0.00;0").unwrap();
    writeln!(out, "GPF_T1.Output_registro;{};####;1", batch.start.format("%d/%m/%Y %H:%M:%S")).unwrap();

    out
}

/// Comma-delimited ledger: exact codes for the BA batches, and a code the
/// GPF batch only reaches through the fragment fallback ("1226").
fn render_ledger() -> String {
    let mut out = String::from("Lote,Estado,Rendimiento,Fecha\n");
    out.push_str("BA-03-25,Aprobado,92.3,05/03/2025\n");
    out.push_str("BA-04-25,Rechazado,71.0,12/03/2025\n");
    out.push_str("FER-1226-A,Aprobado,88.9,19/03/2025\n");
    out
}
