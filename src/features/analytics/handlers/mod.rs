pub mod analytics_handler;
