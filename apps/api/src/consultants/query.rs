//! Consultant search: turns listing filters into parameterized SQL.
//!
//! Every user-supplied value is bound; only whitelisted fragments (sort keys)
//! are pushed as raw SQL.

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::contains_pattern;
use crate::errors::AppError;
use crate::models::consultant::{ContractType, Grade};
use crate::pagination::PageRequest;

const LISTING_SELECT: &str = "\
    SELECT c.*, p.name AS practice_name, \
           (SELECT COUNT(*) FROM missions m WHERE m.consultant_id = c.id) AS mission_count, \
           (SELECT m.client FROM missions m \
             WHERE m.consultant_id = c.id AND m.status = 'en_cours' \
             ORDER BY m.start_date DESC LIMIT 1) AS current_client \
    FROM consultants c \
    LEFT JOIN practices p ON p.id = c.practice_id";

const COUNT_SELECT: &str = "SELECT COUNT(*) FROM consultants c";

/// Raw query-string filters for `GET /consultants`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultantFilters {
    pub search: Option<String>,
    pub practice_id: Option<Uuid>,
    pub grade: Option<String>,
    pub contract_type: Option<String>,
    pub company: Option<String>,
    pub available: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Salary,
    HireDate,
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            descending: false,
        }
    }
}

impl Sort {
    /// Accepts `name`, `salary`, `hire_date`, `created`, optionally prefixed with `-`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        let (descending, key) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let key = match key {
            "name" => SortKey::Name,
            "salary" => SortKey::Salary,
            "hire_date" => SortKey::HireDate,
            "created" => SortKey::Created,
            other => {
                return Err(AppError::Validation(format!(
                    "unknown sort key '{other}' (expected name, salary, hire_date or created)"
                )))
            }
        };
        Ok(Self { key, descending })
    }

    fn order_by(&self) -> String {
        let dir = if self.descending { "DESC" } else { "ASC" };
        let nulls = if self.descending { "NULLS LAST" } else { "NULLS FIRST" };
        match self.key {
            SortKey::Name => format!("c.last_name {dir}, c.first_name {dir}, c.id"),
            SortKey::Salary => format!("c.salary {dir} {nulls}, c.id"),
            SortKey::HireDate => format!("c.hire_date {dir} {nulls}, c.id"),
            SortKey::Created => format!("c.created_at {dir}, c.id"),
        }
    }
}

/// Validated, typed search parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub search: Option<String>,
    pub practice_id: Option<Uuid>,
    pub grade: Option<Grade>,
    pub contract_type: Option<ContractType>,
    pub company: Option<String>,
    pub available: Option<bool>,
    pub page: PageRequest,
    pub sort: Sort,
}

impl TryFrom<ConsultantFilters> for SearchParams {
    type Error = AppError;

    fn try_from(filters: ConsultantFilters) -> Result<Self, Self::Error> {
        let grade = non_blank(filters.grade)
            .map(|g| g.parse::<Grade>())
            .transpose()
            .map_err(AppError::Validation)?;
        let contract_type = non_blank(filters.contract_type)
            .map(|c| c.parse::<ContractType>())
            .transpose()
            .map_err(AppError::Validation)?;
        let sort = match non_blank(filters.sort) {
            Some(raw) => Sort::parse(&raw)?,
            None => Sort::default(),
        };

        Ok(Self {
            search: non_blank(filters.search),
            practice_id: filters.practice_id,
            grade,
            contract_type,
            company: non_blank(filters.company),
            available: filters.available,
            page: PageRequest::new(filters.page, filters.per_page),
            sort,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Builds the paginated listing query.
pub fn build_search_query(params: &SearchParams, today: NaiveDate) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(LISTING_SELECT);
    push_filters(&mut qb, params, today);
    qb.push(" ORDER BY ");
    qb.push(params.sort.order_by());
    qb.push(" LIMIT ");
    qb.push_bind(params.page.per_page);
    qb.push(" OFFSET ");
    qb.push_bind(params.page.offset());
    qb
}

/// Builds the `COUNT(*)` query sharing the listing's WHERE clause.
pub fn build_count_query(params: &SearchParams, today: NaiveDate) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(COUNT_SELECT);
    push_filters(&mut qb, params, today);
    qb
}

fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, params: &SearchParams, today: NaiveDate) {
    let mut first = true;

    if let Some(search) = &params.search {
        let pattern = contains_pattern(search);
        qb.push(separator(&mut first));
        qb.push("(c.first_name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR c.last_name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR (c.first_name || ' ' || c.last_name) ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR c.email ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(practice_id) = params.practice_id {
        qb.push(separator(&mut first));
        qb.push("c.practice_id = ");
        qb.push_bind(practice_id);
    }

    if let Some(grade) = params.grade {
        qb.push(separator(&mut first));
        qb.push("c.grade = ");
        qb.push_bind(grade.as_str());
    }

    if let Some(contract_type) = params.contract_type {
        qb.push(separator(&mut first));
        qb.push("c.contract_type = ");
        qb.push_bind(contract_type.as_str());
    }

    if let Some(company) = &params.company {
        qb.push(separator(&mut first));
        qb.push("lower(c.company) = lower(");
        qb.push_bind(company.clone());
        qb.push(")");
    }

    match params.available {
        Some(true) => {
            qb.push(separator(&mut first));
            qb.push("(c.available = TRUE OR (c.availability_date IS NOT NULL AND c.availability_date <= ");
            qb.push_bind(today);
            qb.push("))");
        }
        Some(false) => {
            qb.push(separator(&mut first));
            qb.push("(c.available = FALSE AND (c.availability_date IS NULL OR c.availability_date > ");
            qb.push_bind(today);
            qb.push("))");
        }
        None => {}
    }
}

fn separator(first: &mut bool) -> &'static str {
    if std::mem::replace(first, false) {
        " WHERE "
    } else {
        " AND "
    }
}
