//! SQL dialect providers
//!
//! Each database speaks a slightly different SQL: the prompt the model sees,
//! identifier quoting and bind placeholders all depend on it.

use crate::ai_sql::schema::SchemaContext;
use crate::database::{quote_identifier, DatabaseType};

/// Trait for database-specific SQL dialect handling
pub trait SqlDialectProvider: Send + Sync {
    /// Get the database type this dialect handles
    fn database_type(&self) -> DatabaseType;

    /// Get the display name for this dialect
    fn dialect_name(&self) -> &str;

    /// Dialect-specific rules appended to the SQL generation system prompt
    fn dialect_rules(&self) -> &str;

    /// Bind placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String;

    /// Quote identifier (table name, column name) according to database rules
    fn quote_identifier(&self, identifier: &str) -> String {
        quote_identifier(identifier)
    }

    /// Generate system prompt for SQL generation
    fn system_prompt(&self, top_k: usize) -> String {
        format!(
            r#"You are a {dialect} expert. Given an input question, create a syntactically correct {dialect} query to run.
Unless the user specifies in the question a specific number of examples to obtain, query for at most {top_k} results using the LIMIT clause as per {dialect}. You can order the results to return the most informative data in the database.
Never query for all columns from a table. You must query only the columns that are needed to answer the question. Wrap each column name in double quotes (") to denote them as delimited identifiers.
Pay attention to use only the column names you can see in the tables below. Be careful to not query for columns that do not exist. Also, pay attention to which column is in which table.
{rules}

Output ONLY the SQL query: no explanations, no markdown code fences, no "SQLQuery:" prefix."#,
            dialect = self.dialect_name(),
            top_k = top_k,
            rules = self.dialect_rules(),
        )
    }

    /// Format schema context for this database (how to present tables/columns to AI)
    fn format_schema_context(&self, schema: &SchemaContext) -> String {
        let mut context = format!(
            "Database: {} ({})\n\nOnly use the following tables:\n",
            schema.current_database,
            self.dialect_name()
        );

        for table in &schema.tables {
            let columns: Vec<String> = table
                .columns
                .iter()
                .map(|col| {
                    let mut def = format!("\t{} {}", self.quote_identifier(&col.name), col.data_type);
                    if !col.nullable {
                        def.push_str(" NOT NULL");
                    }
                    def
                })
                .collect();
            context.push_str(&format!(
                "\nCREATE TABLE {} (\n{}\n)\n",
                self.quote_identifier(&table.name),
                columns.join(",\n")
            ));

            if let Some(samples) = &table.sample_rows {
                context.push_str(&format!(
                    "\n/*\n{} rows from {} table:\n{}\n",
                    samples.rows.len(),
                    table.name,
                    samples.columns.join("\t")
                ));
                for row in &samples.rows {
                    let values: Vec<String> = row.iter().map(|(_, v)| v.to_string()).collect();
                    context.push_str(&values.join("\t"));
                    context.push('\n');
                }
                context.push_str("*/\n");
            }
        }

        context
    }
}

/// SQLite dialect implementation
pub struct SqliteDialect;

impl SqlDialectProvider for SqliteDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn dialect_name(&self) -> &str {
        "SQLite"
    }

    fn dialect_rules(&self) -> &str {
        "Pay attention to use date('now') function to get the current date, if the question involves \"today\"."
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

/// PostgreSQL dialect implementation
pub struct PostgreSQLDialect;

impl SqlDialectProvider for PostgreSQLDialect {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn dialect_name(&self) -> &str {
        "PostgreSQL"
    }

    fn dialect_rules(&self) -> &str {
        "Pay attention to use CURRENT_DATE function to get the current date, if the question involves \"today\"."
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }
}

/// Create dialect provider for a database type
pub fn create_dialect_provider(database_type: DatabaseType) -> Box<dyn SqlDialectProvider> {
    match database_type {
        DatabaseType::SQLite => Box::new(SqliteDialect),
        DatabaseType::PostgreSQL => Box::new(PostgreSQLDialect),
    }
}
