pub mod decimal_utils;
pub mod time_utils;
pub mod text_utils;
