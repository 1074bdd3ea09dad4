//! Student roster CSV exchange.
//!
//! One header line, then comma-separated cells. Import does not understand
//! quoting beyond stripping a surrounding pair, so a cell that contains a
//! comma splits in two and corrupts its row.

use chrono::NaiveDate;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Student, StudentDraft};

/// Column order for export. The first fifteen columns are also the import
/// positions, so an exported file imports back into the same students.
pub const STUDENT_COLUMNS: [&str; 17] = [
    "first_name_ar",
    "last_name_ar",
    "first_name_en",
    "last_name_en",
    "division",
    "wilaya",
    "date_of_birth",
    "grade",
    "email",
    "student_phone",
    "parent_phone",
    "discord_id",
    "codeforces_username",
    "cses_username",
    "health_flags",
    "id",
    "created_at",
];

const REQUIRED_COLUMNS: usize = 6;

/// Header line as-is, then one line per row with every value quoted and
/// inner quotes doubled.
pub fn export_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = header.join(",");
    for row in rows {
        out.push('\n');
        let cells: Vec<String> = row
            .iter()
            .map(|value| format!("\"{}\"", value.replace('"', "\"\"")))
            .collect();
        out.push_str(&cells.join(","));
    }
    out
}

/// Drops the header line and blank lines, splits the rest on literal commas.
pub fn parse_rows(text: &str) -> Vec<(usize, Vec<String>)> {
    text.split('\n')
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line.split(',').map(clean_cell).collect()))
        .collect()
}

fn clean_cell(cell: &str) -> String {
    let cell = cell.trim();
    match cell
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => cell.to_string(),
    }
}

pub fn student_row(student: &Student) -> Vec<String> {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    vec![
        student.first_name_ar.clone(),
        student.last_name_ar.clone(),
        student.first_name_en.clone(),
        student.last_name_en.clone(),
        student.division.clone(),
        student.wilaya.clone(),
        student
            .date_of_birth
            .map(|d| d.to_string())
            .unwrap_or_default(),
        student.grade.map(|g| g.to_string()).unwrap_or_default(),
        text(&student.email),
        text(&student.student_phone),
        text(&student.parent_phone),
        text(&student.discord_id),
        text(&student.codeforces_username),
        text(&student.cses_username),
        student.health_flags.clone(),
        student.id.to_string(),
        student.created_at.to_string(),
    ]
}

pub fn export_students(students: &[Student]) -> Result<String, AppError> {
    if students.is_empty() {
        return Err(AppError::NotFound("No data to export".to_string()));
    }

    let rows: Vec<Vec<String>> = students.iter().map(student_row).collect();
    Ok(export_table(&STUDENT_COLUMNS, &rows))
}

fn optional(cells: &[String], position: usize) -> Option<String> {
    cells
        .get(position)
        .filter(|value| !value.is_empty())
        .cloned()
}

fn student_from_cells(line: usize, cells: &[String]) -> Result<StudentDraft, AppError> {
    if cells.len() < REQUIRED_COLUMNS {
        return Err(AppError::Validation(format!(
            "Line {}: expected at least {} columns, found {}",
            line,
            REQUIRED_COLUMNS,
            cells.len()
        )));
    }

    let mut draft = StudentDraft::named(&cells[0], &cells[1], &cells[2], &cells[3]);
    draft.division = cells[4].clone();
    draft.wilaya = cells[5].clone();

    draft.date_of_birth = match optional(cells, 6) {
        Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            AppError::Validation(format!("Line {}: invalid date of birth '{}'", line, raw))
        })?),
        None => None,
    };
    draft.grade = match optional(cells, 7) {
        Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
            AppError::Validation(format!("Line {}: invalid grade '{}'", line, raw))
        })?),
        None => None,
    };
    draft.email = optional(cells, 8);
    draft.student_phone = optional(cells, 9);
    draft.parent_phone = optional(cells, 10);
    draft.discord_id = optional(cells, 11);
    draft.codeforces_username = optional(cells, 12);
    draft.cses_username = optional(cells, 13);
    if let Some(flags) = optional(cells, 14) {
        draft.health_flags = flags;
    }

    draft
        .validate()
        .map_err(|e| AppError::Validation(format!("Line {}: {}", line, e)))?;

    Ok(draft)
}

/// Parses a whole upload. The first bad row rejects the file.
pub fn import_students(text: &str) -> Result<Vec<StudentDraft>, AppError> {
    let drafts = parse_rows(text)
        .iter()
        .map(|(line, cells)| student_from_cells(*line, cells))
        .collect::<Result<Vec<_>, _>>()?;

    if drafts.is_empty() {
        return Err(AppError::Validation("CSV file has no student rows".to_string()));
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn student(id: i64, first_en: &str) -> Student {
        Student {
            id,
            first_name_ar: "ياسين".into(),
            last_name_ar: "قاسمي".into(),
            first_name_en: first_en.into(),
            last_name_en: "Kacimi".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2008, 3, 14),
            grade: Some(11),
            wilaya: "Setif".into(),
            email: None,
            student_phone: Some("0555123456".into()),
            parent_phone: None,
            discord_id: None,
            codeforces_username: Some("yacine_k".into()),
            cses_username: None,
            division: "Div 1".into(),
            health_flags: "None".into(),
            created_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn simple_table_round_trips() {
        let text = export_table(&["a", "b"], &[vec!["1".into(), "2".into()]]);
        assert_eq!(text, "a,b\n\"1\",\"2\"");

        let rows = parse_rows(&text);
        assert_eq!(rows, vec![(2, vec!["1".to_string(), "2".to_string()])]);
    }

    #[test]
    fn export_doubles_inner_quotes_but_not_the_header() {
        let text = export_table(&["say"], &[vec!["he said \"hi\"".into()]]);
        assert_eq!(text, "say\n\"he said \"\"hi\"\"\"");
        assert_eq!(parse_rows(&text)[0].1, vec!["he said \"hi\"".to_string()]);
    }

    #[test]
    fn embedded_commas_break_the_row() {
        let text = export_table(&["a", "b"], &[vec!["x,y".into(), "2".into()]]);
        let rows = parse_rows(&text);
        assert_eq!(rows[0].1.len(), 3);
        assert_ne!(rows[0].1, vec!["x,y".to_string(), "2".to_string()]);
    }

    #[test]
    fn header_and_blank_lines_are_skipped() {
        let rows = parse_rows("h1,h2\n\n1,2\n   \n3,4\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 3);
        assert_eq!(rows[1].1, vec!["3".to_string(), "4".to_string()]);
    }

    #[test]
    fn import_maps_fixed_positions() {
        let csv = "ar_first,ar_last,en_first,en_last,division,wilaya\n\
                   أمين,بن علي,Amine,Benali,Div 1,Oran\n\
                   سارة,حداد,Sara,Haddad,AOAI,Blida";
        let drafts = import_students(csv).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].first_name_en, "Amine");
        assert_eq!(drafts[0].division, "Div 1");
        assert_eq!(drafts[0].wilaya, "Oran");
        assert_eq!(drafts[1].last_name_ar, "حداد");
        assert_eq!(drafts[1].health_flags, "None");
        assert!(drafts[1].grade.is_none());
    }

    #[test]
    fn one_short_row_rejects_the_whole_file() {
        let csv = "h\nأمين,بن علي,Amine,Benali,Div 1,Oran\nonly,three,cells";
        match import_students(csv) {
            Err(AppError::Validation(msg)) => assert!(msg.starts_with("Line 3"), "{msg}"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_upload_is_rejected() {
        assert!(matches!(
            import_students("just,a,header\n"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn exported_students_import_back() {
        let students = vec![student(7, "Yacine"), student(8, "Walid")];
        let text = export_students(&students).unwrap();
        assert!(text.starts_with("first_name_ar,last_name_ar,"));

        let drafts = import_students(&text).unwrap();
        assert_eq!(drafts.len(), 2);
        for (draft, original) in drafts.iter().zip(&students) {
            assert_eq!(draft.first_name_en, original.first_name_en);
            assert_eq!(draft.first_name_ar, original.first_name_ar);
            assert_eq!(draft.date_of_birth, original.date_of_birth);
            assert_eq!(draft.grade, original.grade);
            assert_eq!(draft.student_phone, original.student_phone);
            assert_eq!(draft.codeforces_username, original.codeforces_username);
            assert_eq!(draft.email, None);
            assert_eq!(draft.division, original.division);
        }
    }

    #[test]
    fn nothing_to_export() {
        assert!(matches!(export_students(&[]), Err(AppError::NotFound(_))));
    }
}
