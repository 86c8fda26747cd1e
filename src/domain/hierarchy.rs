use std::collections::HashMap;

use thiserror::Error;

use crate::domain::models::Company;

/// Parent id carried by top-level companies in vendor data.
pub const ROOT_PARENT_ID: i64 = 2;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("company hierarchy contains a parent cycle through company {company_id}")]
pub struct HierarchyCycleError {
    pub company_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyForest {
    children: HashMap<i64, Vec<Company>>,
}

impl CompanyForest {
    pub fn children_of(&self, parent_id: i64) -> &[Company] {
        self.children
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

pub fn build_forest(companies: &[Company]) -> CompanyForest {
    let mut children: HashMap<i64, Vec<Company>> = HashMap::new();
    for company in companies {
        children
            .entry(company.parent_id)
            .or_default()
            .push(company.clone());
    }
    CompanyForest { children }
}

pub fn render(
    forest: &CompanyForest,
    root_id: i64,
    prefix: &str,
) -> Result<String, HierarchyCycleError> {
    let mut output = String::new();
    let mut path = vec![root_id];
    render_children(forest, root_id, prefix, &mut path, &mut output)?;
    Ok(output)
}

fn render_children(
    forest: &CompanyForest,
    parent_id: i64,
    prefix: &str,
    path: &mut Vec<i64>,
    output: &mut String,
) -> Result<(), HierarchyCycleError> {
    let children = forest.children_of(parent_id);

    for (index, company) in children.iter().enumerate() {
        if path.contains(&company.id) {
            return Err(HierarchyCycleError {
                company_id: company.id,
            });
        }

        let is_last = index + 1 == children.len();
        let (connector, extension) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        output.push_str(prefix);
        output.push_str(connector);
        output.push_str(&company.name);
        output.push('\n');

        path.push(company.id);
        render_children(
            forest,
            company.id,
            &format!("{prefix}{extension}"),
            path,
            output,
        )?;
        path.pop();
    }

    Ok(())
}
