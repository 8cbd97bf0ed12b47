pub mod donation;
pub mod extra_work;
pub mod lenient;
pub mod milestone;
pub mod petty_cash;
pub mod report;
pub mod schedule;
pub mod session;
pub mod site;
pub mod supply;
