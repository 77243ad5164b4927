use chrono::NaiveDate;
use pavdash_core::{Activity, ActivityCatalog, Metric, Month, ProjectId};
use pavdash_loader::{discover_files, load_directory, LoadError, LoaderOptions};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn act(index: u8) -> Activity {
    Activity::new(index).unwrap()
}

/// How the date of a fixture row is stored
enum DateCell {
    /// Excel serial with a date number format
    Excel(f64),
    Text(&'static str),
    Blank,
}

/// One fixture row: the date, then a base figure. Activity k gets
/// `base * k` daily, `base * k * 10` realized and `base * k * 12` planned.
struct Row(DateCell, f64);

fn headers() -> Vec<String> {
    let mut names = vec!["Dias".to_string()];
    for metric in Metric::ALL {
        for activity in Activity::all() {
            names.push(metric.column_name(activity));
        }
    }
    names
}

fn write_workbook(path: &Path, headers: &[String], rows: &[Row]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let sheet = workbook.add_worksheet();

    for (col, name) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, name).unwrap();
    }
    for (i, Row(day, base)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        match day {
            DateCell::Excel(serial) => {
                sheet
                    .write_number_with_format(r, 0, *serial, &date_format)
                    .unwrap();
            }
            DateCell::Text(text) => {
                sheet.write_string(r, 0, *text).unwrap();
            }
            DateCell::Blank => {}
        }
        for (offset, factor) in [1.0, 10.0, 12.0].into_iter().enumerate() {
            for k in 1..=5u16 {
                let col = 1 + offset as u16 * 5 + (k - 1);
                sheet
                    .write_number(r, col, base * f64::from(k) * factor)
                    .unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

fn production_file(dir: &Path, id: &str, rows: &[Row]) -> PathBuf {
    let path = dir.join(format!("Produção_Diária_Obra_{id}.xlsx"));
    write_workbook(&path, &headers(), rows);
    path
}

#[test]
fn loads_every_site_in_directory() {
    let dir = TempDir::new().unwrap();
    production_file(
        dir.path(),
        "12",
        &[
            // 45355 = 2024-03-04
            Row(DateCell::Excel(45355.0), 1.0),
            Row(DateCell::Text("2024-03-05"), 2.0),
            Row(DateCell::Text("06/03/2024"), 3.0),
        ],
    );
    production_file(dir.path(), "15", &[Row(DateCell::Text("2024-04-01"), 5.0)]);
    std::fs::write(dir.path().join("notas.txt"), "ignored").unwrap();

    let ctx = load_directory(dir.path(), &LoaderOptions::default(), ActivityCatalog::default())
        .unwrap();

    let ids: Vec<String> = ctx.projects().map(|p| p.id().to_string()).collect();
    assert_eq!(ids, vec!["12", "15"]);

    let site = ctx.project(&ProjectId::from("12")).unwrap();
    assert_eq!(site.len(), 3);
    assert_eq!(site.date_range(), Some((date(2024, 3, 4), date(2024, 3, 6))));

    let third = &site.records()[2];
    assert_eq!(third.value(Metric::DailyProduction, act(2)), Some(6.0));
    assert_eq!(third.value(Metric::CumulativeActual, act(2)), Some(60.0));
    assert_eq!(third.value(Metric::CumulativePlanned, act(5)), Some(180.0));

    let other = ctx.project(&ProjectId::from("15")).unwrap();
    assert_eq!(
        other.months().into_iter().collect::<Vec<_>>(),
        vec![Month::new(2024, 4).unwrap()]
    );
}

#[test]
fn trailing_blank_dates_are_skipped() {
    let dir = TempDir::new().unwrap();
    production_file(
        dir.path(),
        "3",
        &[
            Row(DateCell::Text("2024-05-02"), 1.0),
            Row(DateCell::Blank, 0.0),
        ],
    );

    let ctx = load_directory(dir.path(), &LoaderOptions::default(), ActivityCatalog::default())
        .unwrap();
    assert_eq!(ctx.project(&ProjectId::from("3")).unwrap().len(), 1);
}

#[test]
fn missing_directory_is_empty() {
    let dir = TempDir::new().unwrap();
    let ctx = load_directory(
        dir.path().join("nao-existe"),
        &LoaderOptions::default(),
        ActivityCatalog::default(),
    )
    .unwrap();
    assert!(ctx.is_empty());
}

#[test]
fn missing_column_names_file() {
    let dir = TempDir::new().unwrap();
    let mut names = headers();
    names.retain(|n| n != "prev acum 4");
    let path = dir.path().join("Produção_Diária_Obra_9.xlsx");
    write_workbook(&path, &names, &[Row(DateCell::Text("2024-01-02"), 1.0)]);

    let err = load_directory(dir.path(), &LoaderOptions::default(), ActivityCatalog::default())
        .unwrap_err();
    assert!(matches!(
        &err,
        LoadError::MissingColumn { column, .. } if column == "prev acum 4"
    ));
    assert!(err.to_string().contains("Obra_9.xlsx"));
}

#[test]
fn duplicate_dates_are_fatal() {
    let dir = TempDir::new().unwrap();
    production_file(
        dir.path(),
        "4",
        &[
            Row(DateCell::Text("2024-01-02"), 1.0),
            Row(DateCell::Text("02/01/2024"), 2.0),
        ],
    );

    let err = load_directory(dir.path(), &LoaderOptions::default(), ActivityCatalog::default())
        .unwrap_err();
    assert!(matches!(err, LoadError::Dataset { .. }));
}

#[test]
fn duplicate_project_ids_are_fatal() {
    let dir = TempDir::new().unwrap();
    production_file(dir.path(), "Norte_8", &[Row(DateCell::Text("2024-01-02"), 1.0)]);
    production_file(dir.path(), "Sul_8", &[Row(DateCell::Text("2024-01-02"), 1.0)]);

    let err = load_directory(dir.path(), &LoaderOptions::default(), ActivityCatalog::default())
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::DuplicateProject { ref id, .. } if id.as_str() == "8"
    ));
}

#[test]
fn custom_prefix_and_case_insensitive_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Obra_21.XLSX");
    write_workbook(&path, &headers(), &[Row(DateCell::Text("2024-02-01"), 1.0)]);
    production_file(dir.path(), "22", &[Row(DateCell::Text("2024-02-01"), 1.0)]);

    let found = discover_files(dir.path(), "Obra_").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].project, ProjectId::from("21"));

    let ctx = load_directory(
        dir.path(),
        &LoaderOptions::new().file_prefix("Obra_"),
        ActivityCatalog::default(),
    )
    .unwrap();
    assert_eq!(ctx.len(), 1);
}

#[test]
fn unreadable_workbook_is_fatal() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Produção_Diária_Obra_5.xlsx"), b"not a zip").unwrap();

    let err = load_directory(dir.path(), &LoaderOptions::default(), ActivityCatalog::default())
        .unwrap_err();
    assert!(matches!(err, LoadError::Workbook { .. }));
}
