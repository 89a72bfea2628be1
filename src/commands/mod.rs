pub mod checkout_cmd;
pub mod coupon_cmd;
