pub mod si7050;
