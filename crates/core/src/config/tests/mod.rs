mod app_config_tests;
mod loading_tests;
