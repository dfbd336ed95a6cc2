//! # Default Task Prompts
//!
//! The default, hardcoded prompt templates for the three model tasks.
//! They are loaded programmatically by the server and can be overridden by
//! `config.yml`.

// --- SQL Generation ---

pub const SQL_GENERATION_SYSTEM_PROMPT: &str = "You are an expert SQL generator.";

/// Placeholders: `{schema}`, `{question}`. Each must appear exactly once.
pub const SQL_GENERATION_USER_PROMPT: &str = r#"The database schema is given below in JSON format:

{schema}

Rules:
- Generate only a valid PostgreSQL SELECT query.
- Use only the tables and columns that appear in the JSON schema above.
- Do not invent new columns or tables.
- Do not include explanations, comments, or anything else.
- Do not use multiple statements, only one SQL query.
- For any user input involving state, district, or assessment_unit_name, use the PostgreSQL pg_trgm extension's fuzzy matching operator (%) in the WHERE clause. For example: WHERE state % 'user_input' or assessment_unit_name % 'user_input'.
- Only output the SQL query. Do not include any explanation or formatting.

Question: {question}
SQL:"#;

// --- Answer Summary ---

pub const ANSWER_SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant. Given the following SQL query and its results, summarize the answer in natural language for the user.";

/// Placeholders: `{sql}`, `{results}`.
pub const ANSWER_SUMMARY_USER_PROMPT: &str = r#"SQL Query:
{sql}

Results:
{results}

Provide a concise, clear answer for the user."#;

// --- Forecast ---

pub const FORECAST_SYSTEM_PROMPT: &str = "You are an expert data scientist. Given the following SQL query and its results, forecast the next value(s) for the relevant time period (e.g., next year).";

/// Placeholders: `{question}`, `{sql}`, `{results}`.
pub const FORECAST_USER_PROMPT: &str = r#"Question: {question}
SQL Query:
{sql}

Results:
{results}

Return ONLY a valid JSON array of objects, where each object has:
- 'year': the year (existing or predicted)
- 'value': the value for that year
- 'existing': true if it is from the original data, false if it is a prediction

Also, provide a separate string (not in the array) called 'reason' explaining why the predicted values were given.

Return a JSON object with two keys:
- 'data': the array of year/value/existing objects
- 'reason': the reasoning string

Return ONLY a valid JSON object with this structure. Do not include any explanation or text outside the JSON."#;

/// Appended to a forecast question before SQL generation so the query returns
/// a time series rather than an aggregate.
pub const FORECAST_QUESTION_SUFFIX: &str = "\n\nPlease return the 'year' column and the main numeric measure needed for this question. Ensure results include all available years up to the latest in the database, with rows sorted by year ascending. Do not aggregate unless asked.";
