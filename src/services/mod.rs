pub mod aggregator;
pub mod dashboard;
pub mod openweather;
pub mod preferences;
pub mod refresher;
pub mod storage;
pub mod weather;
