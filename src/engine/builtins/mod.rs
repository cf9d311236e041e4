pub mod math;
pub mod memo;
pub mod special_forms;
