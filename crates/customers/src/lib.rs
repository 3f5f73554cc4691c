//! `orderdesk-customers` — customer records and their management service.

pub mod customer;
pub mod service;
pub mod store;

pub use customer::{Address, Customer, CustomerId, CustomerUpdate, NewCustomer};
pub use service::CustomerService;
pub use store::CustomerStore;
