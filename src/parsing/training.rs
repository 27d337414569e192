use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Header labels recognised as training columns.
///
/// The list is matched by label text, never by position, so the repeated
/// `"Delta"` entries are kept as they appear in the source spreadsheets.
pub const TRAINING_COLUMNS: [&str; 34] = [
    "Delta",
    "Charla y Trans AQP",
    "Ult SIM",
    "Vence SIM BD",
    "Ult PC",
    "Delta",
    "Planif SIM",
    "CAT",
    "Prog SIM",
    "Ult LC",
    "Vence LC",
    "Delta",
    "Planif LC",
    "Prog LC",
    "Ult RTI 1",
    "Vence RTI 1",
    "Delta",
    "Planif RTI 1",
    "Prog RTI 1",
    "Ult RTI 2",
    "Vence RTI 2",
    "Delta",
    "Planif RTI 2",
    "Prog RTI 2",
    "Ult CRM",
    "Vence CRM",
    "Delta",
    "Planif CRM",
    "Prog CRM",
    "Ult Ditching",
    "Vence Ditching",
    "Delta",
    "Planif Ditching",
    "Prog Ditching",
];

const ID_COLUMN: usize = 0;
const NAME_COLUMN: usize = 1;
const FIRST_TRAINING_COLUMN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    pub id: String,
    pub name: String,
    /// 1-based position among the data rows (the header row is not counted).
    pub row_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrainingRecord {
    pub employee_id: String,
    pub employee_name: String,
    /// Header label of the column that produced the record.
    pub training_type: String,
    /// Trimmed cell content. Not parsed, the sheets mix dates and free text.
    pub date: String,
    pub row_index: usize,
    /// 0-based index into the header row.
    pub col_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParseResult {
    pub employees: Vec<Employee>,
    pub trainings: Vec<TrainingRecord>,
    pub headers: Vec<String>,
}

pub fn is_training_column(label: &str) -> bool {
    TRAINING_COLUMNS.contains(&label)
}

/// Convert a raw sheet grid into employees and their training records.
///
/// Row 0 holds the headers, column 0 the employee id and column 1 the name.
/// Rows without an id or a name are dropped together with their cells, and
/// ragged rows simply stop contributing once their cells run out.
pub fn parse_training_data(grid: &[Vec<String>]) -> ParseResult {
    let Some((headers, rows)) = grid.split_first() else {
        return ParseResult::default();
    };
    if rows.is_empty() {
        return ParseResult::default();
    }

    let mut employees = Vec::new();
    let mut trainings = Vec::new();

    for (offset, row) in rows.iter().enumerate() {
        let row_index = offset + 1;
        if row.len() <= NAME_COLUMN {
            continue;
        }

        let employee_id = &row[ID_COLUMN];
        let employee_name = &row[NAME_COLUMN];
        if employee_id.trim().is_empty() || employee_name.trim().is_empty() {
            continue;
        }

        employees.push(Employee {
            id: employee_id.clone(),
            name: employee_name.clone(),
            row_index,
        });

        for (col_index, header) in headers
            .iter()
            .enumerate()
            .take(row.len())
            .skip(FIRST_TRAINING_COLUMN)
        {
            if !is_training_column(header) {
                continue;
            }
            let value = row[col_index].trim();
            if value.is_empty() {
                continue;
            }
            trainings.push(TrainingRecord {
                employee_id: employee_id.clone(),
                employee_name: employee_name.clone(),
                training_type: header.clone(),
                date: value.to_string(),
                row_index,
                col_index,
            });
        }
    }

    ParseResult {
        employees,
        trainings,
        headers: headers.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_vocabulary_keeps_repeated_delta() {
        assert_eq!(TRAINING_COLUMNS.len(), 34);
        let deltas = TRAINING_COLUMNS.iter().filter(|l| **l == "Delta").count();
        assert_eq!(deltas, 7);
        assert!(is_training_column("Ult SIM"));
        assert!(is_training_column("Prog Ditching"));
        assert!(!is_training_column("ult sim"));
        assert!(!is_training_column("ID"));
    }

    #[test]
    fn test_empty_and_header_only_grids() {
        assert_eq!(parse_training_data(&[]), ParseResult::default());
        let result = parse_training_data(&grid(&[&["ID", "Name", "CAT"]]));
        assert!(result.employees.is_empty());
        assert!(result.trainings.is_empty());
        assert!(result.headers.is_empty());
    }

    #[test]
    fn test_reference_scenario() {
        let result = parse_training_data(&grid(&[
            &["ID", "Name", "Delta", "CAT"],
            &["E1", "Alice", " 2024-01-01 ", "x"],
            &["", "Bob", "2024-02-02", "y"],
        ]));

        assert_eq!(
            result.employees,
            vec![Employee {
                id: "E1".to_string(),
                name: "Alice".to_string(),
                row_index: 1,
            }]
        );
        assert_eq!(
            result.trainings,
            vec![
                TrainingRecord {
                    employee_id: "E1".to_string(),
                    employee_name: "Alice".to_string(),
                    training_type: "Delta".to_string(),
                    date: "2024-01-01".to_string(),
                    row_index: 1,
                    col_index: 2,
                },
                TrainingRecord {
                    employee_id: "E1".to_string(),
                    employee_name: "Alice".to_string(),
                    training_type: "CAT".to_string(),
                    date: "x".to_string(),
                    row_index: 1,
                    col_index: 3,
                },
            ]
        );
        assert_eq!(result.headers, vec!["ID", "Name", "Delta", "CAT"]);
    }

    #[test]
    fn test_ragged_row_keeps_employee() {
        let result = parse_training_data(&grid(&[
            &["ID", "Name", "Ult SIM", "Vence SIM BD", "Ult PC"],
            &["E7", "Grace", "2023-05-01"],
        ]));
        assert_eq!(result.employees.len(), 1);
        assert_eq!(result.trainings.len(), 1);
        assert_eq!(result.trainings[0].training_type, "Ult SIM");
    }

    #[test]
    fn test_whitespace_cells_are_empty() {
        let result = parse_training_data(&grid(&[
            &["ID", "Name", "CAT", "Ult LC"],
            &["E1", "Alice", "   ", "\t"],
        ]));
        assert_eq!(result.employees.len(), 1);
        assert!(result.trainings.is_empty());
    }

    #[test]
    fn test_unknown_headers_are_ignored() {
        let result = parse_training_data(&grid(&[
            &["ID", "Name", "Notes", "CAT", "cat"],
            &["E1", "Alice", "2024-01-01", "2024-02-02", "2024-03-03"],
        ]));
        assert_eq!(result.trainings.len(), 1);
        assert_eq!(result.trainings[0].col_index, 3);
    }

    #[test]
    fn test_short_and_nameless_rows_are_skipped() {
        let result = parse_training_data(&grid(&[
            &["ID", "Name", "CAT"],
            &["E1"],
            &[],
            &["E2", "", "2024-01-01"],
            &["E3", "  ", "2024-01-01"],
            &["E4", "Dan", "2024-01-01"],
        ]));
        assert_eq!(result.employees.len(), 1);
        assert_eq!(result.employees[0].id, "E4");
        assert_eq!(result.employees[0].row_index, 5);
        assert_eq!(result.trainings.len(), 1);
        assert_eq!(result.trainings[0].row_index, 5);
    }

    #[test]
    fn test_delta_matches_every_position() {
        let result = parse_training_data(&grid(&[
            &["ID", "Name", "Delta", "Ult SIM", "Delta", "Ult LC", "Delta"],
            &["E1", "Alice", "1", "2024-01-01", "2", "2024-02-02", "3"],
        ]));
        let delta_columns: Vec<usize> = result
            .trainings
            .iter()
            .filter(|t| t.training_type == "Delta")
            .map(|t| t.col_index)
            .collect();
        assert_eq!(delta_columns, vec![2, 4, 6]);
        assert_eq!(result.trainings.len(), 5);
    }

    #[test]
    fn test_records_reference_known_employees() {
        let input = grid(&[
            &["ID", "Name", "CAT", "Ult CRM"],
            &["E1", "Alice", "a", "b"],
            &["", "Ghost", "c", "d"],
            &["E2", "Bob", "", "e"],
        ]);
        let result = parse_training_data(&input);
        for training in &result.trainings {
            assert!(result.employees.iter().any(|e| {
                e.id == training.employee_id
                    && e.name == training.employee_name
                    && e.row_index == training.row_index
            }));
        }
        assert_eq!(result, parse_training_data(&input));
    }
}
