//! Defines the special form keywords recognized by the evaluator.

// Constants for individual special form names, can be used for matching.
pub const DEFINE: &str = "define";
pub const IF: &str = "if";
pub const LAMBDA: &str = "lambda";

/// Array of special form names. These are reserved: they cannot be bound by
/// `define` or appear as `lambda` parameters.
pub const SPECIAL_FORMS: &[&str] = &[DEFINE, IF, LAMBDA];

/// Checks if a given name is a special form.
///
/// # Arguments
/// * `name` - The name to check.
///
/// # Returns
/// `true` if the name is a special form, `false` otherwise.
pub fn is_special_form(name: &str) -> bool {
    SPECIAL_FORMS.contains(&name)
}
