//! Job parameter summaries built from a hand-written projection query
//!
//! The job name is bound as a query parameter; only identifiers read from the
//! catalog or configuration are spliced into the SQL text, and those are quoted.

use crate::ai_sql::SqlDialectProvider;
use crate::chat::error::{execution_error, ChatResult};
use crate::chat::schema::SchemaInspector;
use crate::chat::session::SessionMemory;
use crate::config::ChatConfig;
use crate::database::{DatabaseClient, QueryResult};
use tracing::{debug, info};

pub const NO_JOB_NAME_MESSAGE: &str =
    "No job name found in your input and no job name stored in memory. Please provide a job name.";

/// What the caller parsed out of a summary request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub job_name_hint: Option<String>,
    pub filter_to_awi: bool,
}

pub struct ParameterSummarizer {
    config: ChatConfig,
    inspector: SchemaInspector,
}

impl ParameterSummarizer {
    pub fn new(config: ChatConfig, inspector: SchemaInspector) -> Self {
        Self { config, inspector }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn inspector_mut(&mut self) -> &mut SchemaInspector {
        &mut self.inspector
    }

    pub async fn summarize(
        &mut self,
        request: SummaryRequest,
        memory: &mut SessionMemory,
        database: &dyn DatabaseClient,
        dialect: &dyn SqlDialectProvider,
    ) -> ChatResult<String> {
        let job_name = match request.job_name_hint {
            Some(name) => {
                memory.remember(name.clone());
                name
            }
            None => match memory.recall() {
                Some(name) => {
                    debug!("Using job name from session memory");
                    name.to_string()
                }
                None => return Ok(NO_JOB_NAME_MESSAGE.to_string()),
            },
        };

        let header = if request.filter_to_awi {
            format!("AWI Parameters for job_name {}:", job_name)
        } else {
            format!("Parameters for job_name {}:", job_name)
        };

        let columns = self.inspector.columns(database, &self.config.table).await?;
        let Some(sql) = build_query(&columns, &self.config, dialect) else {
            info!(
                "Table {} has no columns besides {}",
                self.config.table, self.config.key_column
            );
            return Ok(render(&header, &[]));
        };

        info!("Summarizing parameters from {}", self.config.table);
        debug!("Summary query: {}", sql);
        let result = database
            .execute_bound(&sql, &[job_name.as_str()])
            .await
            .map_err(execution_error)?;

        let awi_prefix = request.filter_to_awi.then_some(self.config.awi_prefix.as_str());
        Ok(render(&header, &parameter_lines(&result, awi_prefix)))
    }
}

/// Projection of every column except the key, filtered on the key by a bind
/// placeholder. `None` when nothing is left to project.
pub fn build_query(
    columns: &[String],
    config: &ChatConfig,
    dialect: &dyn SqlDialectProvider,
) -> Option<String> {
    let projection: Vec<String> = columns
        .iter()
        .filter(|column| **column != config.key_column)
        .map(|column| dialect.quote_identifier(column))
        .collect();
    if projection.is_empty() {
        return None;
    }

    Some(format!(
        "SELECT {} FROM {} WHERE {} = {}",
        projection.join(", "),
        dialect.quote_identifier(&config.table),
        dialect.quote_identifier(&config.key_column),
        dialect.placeholder(1)
    ))
}

/// `column: value` lines, columns within a row then rows in arrival order.
/// Nulls are dropped, and with `prefix` set only matching columns survive.
fn parameter_lines(result: &QueryResult, prefix: Option<&str>) -> Vec<String> {
    result
        .rows
        .iter()
        .flat_map(|row| {
            row.iter()
                .filter(|(_, value)| !value.is_null())
                .filter(move |(column, _)| prefix.is_none_or(|p| column.starts_with(p)))
                .map(|(column, value)| format!("{column}: {value}"))
        })
        .collect()
}

fn render(header: &str, lines: &[String]) -> String {
    format!("{}\n{}", header, lines.join("\n"))
}
