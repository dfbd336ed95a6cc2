//! # Shared Constants
//!
//! Values shared by the library, the server and the CLI.

/// The language every question is translated into before SQL generation.
pub const PIVOT_LANGUAGE: &str = "en";

/// How many sanitized rows are shown to the model when summarizing an answer.
pub const SUMMARY_ROW_LIMIT: usize = 10;

/// The default location of the JSON schema description given to the model.
pub const DEFAULT_SCHEMA_PATH: &str = "database_schema.json";

/// The questions the CLI asks when none are given.
pub const SAMPLE_QUESTIONS: [&str; 3] = [
    "What was the total rainfall in Telangana in 2019?",
    "List the districts in Andaman and Nicobar Islands with their groundwater recharge in 2016.",
    "Retrieve the categorization of groundwater for Jayashankar Bhupalapally district in 2019.",
];
