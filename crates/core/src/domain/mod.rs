pub mod actor;
pub mod appointment;
pub mod approval;
pub mod contract;
pub mod dismissal;
pub mod employee;
pub mod resignation;
pub mod salary;
