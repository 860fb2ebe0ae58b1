/// Reference dataset the model is asked to imitate.
pub const REFERENCE_SCHEMA: &str = include_str!("../../tdata/schema.json");

/// Placeholder in the reference schema swapped for a unique suffix when the
/// user does not name the schema.
pub const NAME_PLACEHOLDER: &str = "@@@REPLACE_ME@@@";

pub fn build_prompt(user_input: &str, unique_suffix: i64) -> String {
    format!(
        "Given a reference json schema like:\n\n{}\n\nGive me another schema taking into account:\n\n{}\n\n\
         If a schema name is provided, set schemaName to the name provided. If not, replace {} with {}.\n\
         Do not explain anything. Return only the required JSON. Do not format the response as markdown.",
        REFERENCE_SCHEMA.trim(),
        user_input.trim(),
        NAME_PLACEHOLDER,
        unique_suffix
    )
}
