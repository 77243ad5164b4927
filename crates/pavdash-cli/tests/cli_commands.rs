//! CLI integration tests
//!
//! Run the `pavdash` binary against scratch directories of real `.xlsx`
//! files.
//!
//! ## Exit Code Contract
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success (an empty data directory included) |
//! | 1 | Failure: unreadable or malformed input, bad arguments |

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pavdash_core::{Activity, Metric};
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

fn pavdash_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pavdash"))
}

/// Run pavdash in `cwd` with a clean environment for its own settings
fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(pavdash_binary())
        .current_dir(cwd)
        .env_remove("PORT")
        .env_remove("PAVDASH_HOST")
        .env_remove("PAVDASH_DATA_DIR")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to execute pavdash")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Write a production workbook; each row is a text date and a base figure
fn write_site(dir: &Path, id: &str, rows: &[(&str, f64)]) -> PathBuf {
    let path = dir.join(format!("Produção_Diária_Obra_{}.xlsx", id));
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 0, "Dias").unwrap();
    let mut col = 1u16;
    for metric in Metric::ALL {
        for activity in Activity::all() {
            sheet
                .write_string(0, col, metric.column_name(activity))
                .unwrap();
            col += 1;
        }
    }

    for (i, (day, base)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, *day).unwrap();
        for c in 1..col {
            sheet.write_number(r, c, base * f64::from(c)).unwrap();
        }
    }

    workbook.save(&path).unwrap();
    path
}

/// Sites 12 (March) and 15 (March into April)
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_site(dir.path(), "12", &[("2024-03-04", 1.0), ("2024-03-05", 2.0)]);
    write_site(
        dir.path(),
        "15",
        &[("2024-03-28", 1.0), ("2024-04-01", 1.5), ("2024-04-02", 2.0)],
    );
    dir
}

// =============================================================================
// check
// =============================================================================

#[test]
fn check_lists_every_project() {
    let dir = data_dir();
    let output = run(dir.path(), &["check", "--data-dir", "."]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Obra 12: 2 rows, 2024-03-04 .. 2024-03-05, months [2024-03]"));
    assert!(out.contains("Obra 15: 3 rows, 2024-03-28 .. 2024-04-02, months [2024-03, 2024-04]"));
    assert!(out.contains("2 project(s) loaded"));
}

#[test]
fn check_reads_data_dir_from_environment() {
    let dir = data_dir();
    let cwd = TempDir::new().unwrap();
    let output = Command::new(pavdash_binary())
        .current_dir(cwd.path())
        .env_remove("PORT")
        .env_remove("PAVDASH_HOST")
        .env("PAVDASH_DATA_DIR", dir.path())
        .arg("check")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("2 project(s) loaded"));
}

#[test]
fn check_empty_directory_succeeds() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notas.txt"), "nada").unwrap();

    let output = run(dir.path(), &["check"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("No production files found"));
}

#[test]
fn check_fails_on_malformed_file() {
    let dir = data_dir();
    let broken = dir.path().join("Produção_Diária_Obra_20.xlsx");
    let mut workbook = Workbook::new();
    workbook
        .add_worksheet()
        .write_string(0, 0, "Data")
        .unwrap();
    workbook.save(&broken).unwrap();

    let output = run(dir.path(), &["check"]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Produção_Diária_Obra_20.xlsx"), "stderr: {}", err);
    assert!(err.contains("missing required column 'Dias'"));
}

#[test]
fn check_uses_config_file_prefix() {
    let dir = data_dir();
    fs::rename(
        dir.path().join("Produção_Diária_Obra_12.xlsx"),
        dir.path().join("Obra_12.xlsx"),
    )
    .unwrap();
    fs::write(dir.path().join("pavdash.toml"), "file_prefix = \"Obra_\"\n").unwrap();

    let output = run(dir.path(), &["check"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Obra 12:"));
    assert!(out.contains("1 project(s) loaded"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = data_dir();
    let output = run(dir.path(), &["--config", "faltando.toml", "check"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("faltando.toml"));
}

// =============================================================================
// render
// =============================================================================

#[test]
fn render_writes_charts_and_page() {
    let dir = data_dir();
    let output = run(
        dir.path(),
        &["render", "--project", "all", "--month", "2024-03", "--out-dir", "saida"],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out_dir = dir.path().join("saida");
    let daily = fs::read_to_string(out_dir.join("daily.svg")).unwrap();
    let summary = fs::read_to_string(out_dir.join("summary.svg")).unwrap();
    let page = fs::read_to_string(out_dir.join("dashboard.html")).unwrap();

    assert!(daily.starts_with("<svg"));
    assert!(daily.contains("Obra 15 - Atividade 5"));
    assert!(summary.contains("Realizado Acumulado"));
    assert!(page.contains("Produção Obras de Pavimentação"));
    assert!(page.contains(r#"<option value="2024-03" selected>2024-03</option>"#));
    assert_eq!(stdout(&output).matches("Wrote ").count(), 3);
}

#[test]
fn render_uses_configured_activity_labels() {
    let dir = data_dir();
    fs::write(
        dir.path().join("pavdash.toml"),
        r#"
[activities]
labels = ["Fresagem", "Rachão", "Base", "Imprimação", "CBUQ"]
"#,
    )
    .unwrap();

    let output = run(
        dir.path(),
        &[
            "render", "--project", "12", "--month", "2024-03", "--activity", "2", "--out-dir", "out",
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let daily = fs::read_to_string(dir.path().join("out/daily.svg")).unwrap();
    assert!(daily.contains("Rachão"));
    assert!(!daily.contains("Fresagem"));
}

#[test]
fn render_rejects_bad_month() {
    let dir = data_dir();
    let output = run(
        dir.path(),
        &["render", "--project", "12", "--month", "março", "--out-dir", "out"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid selection"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn invalid_activity_labels_fail_startup() {
    let dir = data_dir();
    fs::write(
        dir.path().join("pavdash.toml"),
        "[activities]\nlabels = [\"Fresagem\"]\n",
    )
    .unwrap();

    let output = run(dir.path(), &["check"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("activity labels"));
}
