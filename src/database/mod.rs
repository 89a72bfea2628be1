pub mod connection;
pub mod coupons;
pub mod migrations;
