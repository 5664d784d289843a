use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{Employee, Role};

#[derive(Debug, Deserialize)]
struct EmployeeRow {
    name: String,
    email: String,
    #[serde(default)]
    role: String,
}

/// Reads a `name,email,role` roster. Rows without an email are skipped.
pub fn load_employees<P: AsRef<Path>>(path: P) -> Result<Vec<Employee>> {
    let file = std::fs::File::open(path.as_ref())?;
    let employees = parse_employees(file)?;
    tracing::info!("Loaded {} employees from {}", employees.len(), path.as_ref().display());
    Ok(employees)
}

pub fn parse_employees<R: Read>(reader: R) -> Result<Vec<Employee>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?;
    if !headers.iter().any(|h| h == "email") {
        return Err(Error::InvalidTable("employee roster has no email column".to_string()));
    }

    let mut employees = Vec::new();
    for (idx, row) in reader.deserialize::<EmployeeRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Skipping roster row {}: {}", idx + 1, e);
                continue;
            }
        };
        if row.email.is_empty() {
            tracing::warn!("Skipping roster row {}: missing email", idx + 1);
            continue;
        }
        employees.push(Employee {
            name: row.name,
            email: row.email,
            role: Role::from(row.role.as_str()),
        });
    }

    Ok(employees)
}

pub fn recipients_by_role(employees: &[Employee]) -> BTreeMap<Role, Vec<&Employee>> {
    let mut by_role: BTreeMap<Role, Vec<&Employee>> = BTreeMap::new();
    for employee in employees {
        by_role.entry(employee.role).or_default().push(employee);
    }
    by_role
}
