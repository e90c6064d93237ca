pub mod capture;
pub mod classes;
pub mod core;
pub mod dashboard;
pub mod history;
pub mod reports;
pub mod students;
pub mod subjects;
pub mod timetable;
