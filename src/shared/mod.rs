pub mod constants;
#[cfg(test)]
pub mod test_helpers;
pub mod text;
pub mod types;
pub mod validation;
