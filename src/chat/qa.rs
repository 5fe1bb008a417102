//! Free-form questions: generate SQL, run it, describe the result

use crate::ai_sql::AiSqlEngine;
use crate::chat::error::{execution_error, ChatResult};
use crate::database::DatabaseClient;
use tracing::{debug, info};

/// Answer `question` against `database`.
///
/// The generated SQL is executed as-is; read-only access is the database
/// account's job, not this function's.
pub async fn answer_question(
    engine: &mut AiSqlEngine,
    database: &dyn DatabaseClient,
    question: &str,
) -> ChatResult<String> {
    info!("Routing question to SQL generation");

    let sql = engine.generate_sql(question, database).await?;
    let result = database.execute_query(&sql).await.map_err(execution_error)?;
    debug!("Query returned {} rows", result.rows.len());

    let answer = engine.answer(question, &sql, &result.to_text()).await?;
    Ok(answer)
}
