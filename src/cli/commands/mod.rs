pub mod db;
pub mod tenant;
