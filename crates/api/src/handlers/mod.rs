pub mod pvs;
