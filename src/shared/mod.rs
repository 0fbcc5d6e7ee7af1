pub mod constants;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;
