pub mod blamcon;
