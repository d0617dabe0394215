//! Provisioning behaviour driven through feature scenarios.

mod bdd_steps;
mod scenarios;
mod test_helpers;
