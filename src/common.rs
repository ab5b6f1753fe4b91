pub mod db_utils;
pub mod error;
pub mod money;
pub mod pagination;
pub mod validation;
