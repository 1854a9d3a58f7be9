pub mod scenarios;
pub mod valuation;
