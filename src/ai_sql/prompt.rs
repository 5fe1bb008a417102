//! Prompt generation utilities for SQL generation and answer synthesis

/// Prompt generator for AI SQL queries
pub struct PromptGenerator;

impl PromptGenerator {
    /// User prompt for SQL generation: schema first, then the question
    pub fn sql_prompt(question: &str, schema_info: &str) -> String {
        format!("{}\n\nQuestion: {}\nSQLQuery: ", schema_info, question)
    }

    /// System prompt for answer synthesis
    pub fn answer_system_prompt() -> String {
        "You answer questions about a SQL database using only the query result you are given. Be concise.".to_string()
    }

    /// User prompt for answer synthesis
    pub fn answer_prompt(question: &str, query: &str, result: &str) -> String {
        format!(
            "Given the following user question, corresponding SQL query, and SQL result, answer the user question.\n\nQuestion: {}\nSQL Query: {}\nSQL Result: {}\nAnswer: ",
            question, query, result
        )
    }

    /// Strip markdown fences, `SQLQuery:` markers and trailing commentary from a
    /// model response so that only the statement remains
    pub fn extract_sql(response: &str) -> String {
        let mut sql = response.trim();

        if let Some(start) = sql.find("SQLQuery:") {
            sql = &sql[start + "SQLQuery:".len()..];
        }
        if let Some(end) = sql.find("SQLResult:").or_else(|| sql.find("Answer:")) {
            sql = &sql[..end];
        }

        let mut cleaned = sql.trim();
        for fence in ["```sql", "```SQL", "```"] {
            if let Some(rest) = cleaned.strip_prefix(fence) {
                cleaned = rest;
                break;
            }
        }
        if let Some(rest) = cleaned.trim_end().strip_suffix("```") {
            cleaned = rest;
        }

        let mut cleaned = cleaned.trim().to_string();

        // Collapse repeated trailing semicolons
        while cleaned.ends_with(";;") {
            cleaned.pop();
        }

        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("```sql\nSELECT * FROM users;\n```", "SELECT * FROM users;")]
    #[case("```\nSELECT * FROM users;\n```", "SELECT * FROM users;")]
    #[case("SELECT * FROM users;", "SELECT * FROM users;")]
    #[case("  SELECT * FROM users;  ", "SELECT * FROM users;")]
    #[case("SELECT * FROM users;;", "SELECT * FROM users;")]
    #[case("SQLQuery: SELECT COUNT(*) FROM \"Employee\"", "SELECT COUNT(*) FROM \"Employee\"")]
    #[case(
        "SQLQuery: SELECT 1\nSQLResult: [(1,)]\nAnswer: one",
        "SELECT 1"
    )]
    fn test_extract_sql(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(PromptGenerator::extract_sql(input), expected);
    }

    #[test]
    fn test_answer_prompt() {
        let prompt = PromptGenerator::answer_prompt(
            "How many employees are there",
            "SELECT COUNT(*) FROM Employee",
            "[(8,)]",
        );
        assert!(prompt.starts_with("Given the following user question"));
        assert!(prompt.contains("Question: How many employees are there\n"));
        assert!(prompt.contains("SQL Query: SELECT COUNT(*) FROM Employee\n"));
        assert!(prompt.ends_with("SQL Result: [(8,)]\nAnswer: "));
    }

    #[test]
    fn test_sql_prompt() {
        let prompt = PromptGenerator::sql_prompt("top 10 users", "CREATE TABLE users (id INTEGER)");
        assert!(prompt.starts_with("CREATE TABLE users"));
        assert!(prompt.ends_with("Question: top 10 users\nSQLQuery: "));
    }
}
