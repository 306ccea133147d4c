mod support;

mod api_tests;
mod db_tests;
