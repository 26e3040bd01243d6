pub mod kitchen;
pub mod midtrans;
