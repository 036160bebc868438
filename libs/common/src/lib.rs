//! Contract bindings shared by the payroll feed crates.

pub mod interfaces {
    pub mod payroll;
    pub mod token;
}
