pub mod appointment;
pub mod customer;
pub mod service;

pub use appointment::Appointment;
pub use customer::Customer;
pub use service::Service;
