// Declare modules for each special form
pub mod define_form;
pub mod if_form;
pub mod lambda_form;

// Re-export public evaluation functions
pub use define_form::eval_define;
pub use if_form::eval_if;
pub use lambda_form::eval_lambda;
