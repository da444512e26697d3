//! Task CSV loader.
//!
//! The first line is a header whose column set must equal exactly:
//! `TASK_NAME, TASK_HOST, TASK_INITIAL_SLEEP_TIME, TASK_RUN_TIME, TASK_RAM,
//! TASK_NETWORK_TIME, TASK_DEPENDENCY`. Column order is free; duplicate,
//! missing, or extra columns are rejected. Fields are comma-split and
//! trimmed, and every row must have exactly as many fields as the header.
//!
//! `TASK_DEPENDENCY` is either empty or a `;`-separated list of task names.
//! Single-dependency files remain valid unchanged; the separator only
//! matters when more than one dependency is listed.

use std::collections::HashMap;
use std::path::Path;

use crate::config::{ConfigError, ConfigResult};
use crate::task::Task;
use crate::types::SimTime;

const EXPECTED_COLUMNS: [&str; 7] = [
    "TASK_NAME",
    "TASK_HOST",
    "TASK_INITIAL_SLEEP_TIME",
    "TASK_RUN_TIME",
    "TASK_RAM",
    "TASK_NETWORK_TIME",
    "TASK_DEPENDENCY",
];

/// Loads tasks from a CSV file.
pub fn load_tasks(path: &Path) -> ConfigResult<Vec<Task>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    parse_tasks(&text)
}

/// Parses tasks from CSV text.
pub fn parse_tasks(text: &str) -> ConfigResult<Vec<Task>> {
    let mut lines = text.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| ConfigError::Csv("CSV file is empty or has no header".to_string()))?;
    let columns = split_row(header_line);
    let index = validate_header(&columns)?;

    let mut tasks = Vec::new();
    for (offset, line) in lines.enumerate() {
        let row_num = offset + 2;
        let fields = split_row(line);
        if fields.len() != columns.len() {
            return Err(ConfigError::Csv(format!(
                "row {}: expected {} fields, got {}",
                row_num,
                columns.len(),
                fields.len()
            )));
        }
        let task = parse_row(&fields, &index)
            .map_err(|e| ConfigError::Csv(format!("error parsing row {row_num}: {e}")))?;
        tasks.push(task);
    }

    Ok(tasks)
}

fn validate_header(columns: &[String]) -> ConfigResult<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(columns.len());
    for (i, column) in columns.iter().enumerate() {
        if index.insert(column.clone(), i).is_some() {
            return Err(ConfigError::Csv(format!(
                "invalid CSV header: duplicate column {column}"
            )));
        }
    }

    let missing: Vec<&str> = EXPECTED_COLUMNS
        .iter()
        .filter(|c| !index.contains_key(**c))
        .copied()
        .collect();
    let extra: Vec<&str> = columns
        .iter()
        .filter(|c| !EXPECTED_COLUMNS.contains(&c.as_str()))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() || !extra.is_empty() {
        let mut message = "invalid CSV header".to_string();
        if !missing.is_empty() {
            message.push_str(&format!(": missing columns: {}", missing.join(", ")));
        }
        if !extra.is_empty() {
            message.push_str(&format!(": extra columns: {}", extra.join(", ")));
        }
        return Err(ConfigError::Csv(message));
    }

    Ok(index)
}

fn parse_row(fields: &[String], index: &HashMap<String, usize>) -> Result<Task, String> {
    let field = |name: &str| fields[index[name]].as_str();

    let name = field("TASK_NAME");
    if name.is_empty() {
        return Err("TASK_NAME cannot be empty".to_string());
    }

    let dependencies: Vec<String> = field("TASK_DEPENDENCY")
        .split(';')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();

    Ok(Task {
        name: name.to_string(),
        host: field("TASK_HOST").to_string(),
        initial_sleep_time: parse_time(field("TASK_INITIAL_SLEEP_TIME"), "initial sleep time")?,
        run_time: parse_time(field("TASK_RUN_TIME"), "run time")?,
        ram: parse_time(field("TASK_RAM"), "RAM")?,
        network_time: parse_time(field("TASK_NETWORK_TIME"), "network time")?,
        dependencies,
        host_index: 0,
        dependency_indices: Vec::new(),
    })
}

fn parse_time(text: &str, what: &str) -> Result<SimTime, String> {
    let value: i64 = text
        .parse()
        .map_err(|_| format!("invalid {what} '{text}'"))?;
    u64::try_from(value).map_err(|_| format!("{what} must be >= 0, got {value}"))
}

fn split_row(line: &str) -> Vec<String> {
    let mut fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
    // split() already yields a trailing empty field for a trailing comma;
    // a completely empty line is a single empty field.
    if line.is_empty() {
        fields.clear();
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "TASK_NAME,TASK_HOST,TASK_INITIAL_SLEEP_TIME,TASK_RUN_TIME,TASK_RAM,TASK_NETWORK_TIME,TASK_DEPENDENCY";

    #[test]
    fn test_parse_basic_rows() {
        let csv = format!(
            "{HEADER}\n\
             A,HOST_0,0,10,100,0,\n\
             B,HOST_1,5,3,200,4,A\n"
        );
        let tasks = parse_tasks(&csv).unwrap();
        assert_eq!(tasks.len(), 2);

        assert_eq!(tasks[0].name, "A");
        assert_eq!(tasks[0].host, "HOST_0");
        assert_eq!(tasks[0].run_time, 10);
        assert!(tasks[0].dependencies.is_empty());

        assert_eq!(tasks[1].initial_sleep_time, 5);
        assert_eq!(tasks[1].ram, 200);
        assert_eq!(tasks[1].network_time, 4);
        assert_eq!(tasks[1].dependencies, vec!["A".to_string()]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let csv = format!("{HEADER}\n A , HOST_0 , 0 , 1 , 0 , 0 , \n");
        let tasks = parse_tasks(&csv).unwrap();
        assert_eq!(tasks[0].name, "A");
        assert_eq!(tasks[0].host, "HOST_0");
    }

    #[test]
    fn test_header_order_is_free() {
        let csv = "TASK_DEPENDENCY,TASK_NAME,TASK_RAM,TASK_HOST,TASK_RUN_TIME,TASK_NETWORK_TIME,TASK_INITIAL_SLEEP_TIME\n\
                   ,A,50,H,7,0,2\n";
        let tasks = parse_tasks(csv).unwrap();
        assert_eq!(tasks[0].name, "A");
        assert_eq!(tasks[0].ram, 50);
        assert_eq!(tasks[0].run_time, 7);
        assert_eq!(tasks[0].initial_sleep_time, 2);
    }

    #[test]
    fn test_semicolon_separated_dependencies() {
        let csv = format!(
            "{HEADER}\n\
             A,H,0,1,0,0,\n\
             B,H,0,1,0,0,\n\
             C,H,0,1,0,0,A;B\n"
        );
        let tasks = parse_tasks(&csv).unwrap();
        assert_eq!(tasks[2].dependencies, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_dependency_list_trims_and_skips_empties() {
        let csv = format!("{HEADER}\nC,H,0,1,0,0, A ; ;B \n");
        let tasks = parse_tasks(&csv).unwrap();
        assert_eq!(tasks[0].dependencies, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(matches!(parse_tasks(""), Err(ConfigError::Csv(_))));
    }

    #[test]
    fn test_header_only_yields_no_tasks() {
        let tasks = parse_tasks(HEADER).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "TASK_NAME,TASK_HOST,TASK_INITIAL_SLEEP_TIME,TASK_RUN_TIME,TASK_RAM,TASK_NETWORK_TIME\n";
        let err = parse_tasks(csv).unwrap_err();
        assert!(err.to_string().contains("missing columns"));
        assert!(err.to_string().contains("TASK_DEPENDENCY"));
    }

    #[test]
    fn test_extra_column_rejected() {
        let csv = format!("{HEADER},TASK_COLOR\n");
        let err = parse_tasks(&csv).unwrap_err();
        assert!(err.to_string().contains("extra columns"));
        assert!(err.to_string().contains("TASK_COLOR"));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let csv = format!("{HEADER},TASK_NAME\n");
        let err = parse_tasks(&csv).unwrap_err();
        assert!(err.to_string().contains("duplicate column"));
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        let csv = format!("{HEADER}\nA,HOST_0,0,10\n");
        let err = parse_tasks(&csv).unwrap_err();
        assert!(err.to_string().contains("row 2"));
        assert!(err.to_string().contains("expected 7 fields, got 4"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let csv = format!("{HEADER}\n,HOST_0,0,10,0,0,\n");
        let err = parse_tasks(&csv).unwrap_err();
        assert!(err.to_string().contains("TASK_NAME cannot be empty"));
    }

    #[test]
    fn test_negative_run_time_rejected() {
        let csv = format!("{HEADER}\nA,H,0,-5,0,0,\n");
        let err = parse_tasks(&csv).unwrap_err();
        assert!(err.to_string().contains("row 2"));
        assert!(err.to_string().contains(">= 0"));
    }

    #[test]
    fn test_non_numeric_ram_rejected() {
        let csv = format!("{HEADER}\nA,H,0,5,lots,0,\n");
        let err = parse_tasks(&csv).unwrap_err();
        assert!(err.to_string().contains("invalid RAM"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_tasks(Path::new("/nonexistent/tasks.csv"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
