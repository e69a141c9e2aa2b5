pub mod db;
pub mod storage;
